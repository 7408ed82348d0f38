use chrono::NaiveDate;

use crate::models::investment::{Investment, InvestmentType};

/// Sample portfolio shown on first run, before anything has been saved.
pub fn seed_investments() -> Vec<Investment> {
    use InvestmentType::{Currency, Fund, Other};

    let rows: [(&str, (i32, u32, u32), InvestmentType, &str, f64); 16] = [
        ("1", (2025, 10, 6), Fund, "Gümüş Fon", 10_000.0),
        ("2", (2025, 8, 4), Fund, "Gümüş Fon", 11_837.0),
        ("3", (2025, 6, 19), Fund, "Gümüş Fon", 15_000.0),
        ("4", (2025, 3, 5), Fund, "Gümüş Fon", 15_000.0),
        ("5", (2026, 2, 3), Fund, "Altın Fon", 120_000.0),
        ("6", (2025, 12, 3), Fund, "Altın Fon", 40_000.0),
        ("7", (2025, 11, 4), Fund, "Altın Fon", 40_000.0),
        ("8", (2025, 9, 1), Fund, "Altın Fon", 25_000.0),
        ("9", (2025, 5, 9), Fund, "Altın Fon", 40_000.0),
        ("10", (2024, 12, 3), Fund, "Altın Fon", 9_000.0),
        ("11", (2024, 11, 27), Fund, "Altın Fon", 1_000.0),
        ("12", (2025, 1, 1), Other, "GTL", 17_955.0),
        ("13", (2025, 6, 30), Currency, "Dolar", 18_000.0),
        ("14", (2024, 12, 3), Currency, "Dolar", 8_000.0),
        ("15", (2025, 4, 7), Fund, "ALT", 20_000.0),
        ("16", (2024, 12, 6), Fund, "ALT", 15_000.0),
    ];

    rows.into_iter()
        .filter_map(|(id, (y, m, d), investment_type, fund_name, amount)| {
            let date = NaiveDate::from_ymd_opt(y, m, d)?;
            Some(Investment::with_id(id, date, investment_type, fund_name, amount))
        })
        .map(|inv| match inv.id.as_str() {
            "13" => inv.with_price(40.66).with_currency("USD"),
            "14" => inv.with_price(35.33).with_currency("USD"),
            "15" => inv.with_price(3768.0).with_currency("TRY"),
            "16" => inv.with_price(2983.0).with_currency("TRY"),
            _ => inv,
        })
        .collect()
}
