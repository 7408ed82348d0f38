use crate::models::investment::{Investment, InvestmentType, CURRENT_SCHEMA_VERSION};

/// Retired category values that older app versions wrote.
const LEGACY_SILVER: &str = "gümüş";
const LEGACY_GOLD: &str = "altın";

const SILVER_FUND: &str = "Gümüş Fon";
const GOLD_FUND: &str = "Altın Fon";
const GOLD: &str = "Altın";
const DOLLAR: &str = "Dolar";

/// Rewrite records persisted under any earlier schema into the current one.
///
/// Records stamped with the current schema version are returned untouched.
/// Untagged records go through a fixed table of value-sniffing rules and are
/// then stamped. Count, ids and order are preserved, and anything the rules
/// don't recognize passes through as-is. Running it twice is a no-op.
pub fn migrate_investments(investments: Vec<Investment>) -> Vec<Investment> {
    investments.into_iter().map(migrate_investment).collect()
}

/// Migrate a single record. See [`migrate_investments`].
pub fn migrate_investment(mut investment: Investment) -> Investment {
    if investment
        .schema_version
        .is_some_and(|v| v >= CURRENT_SCHEMA_VERSION)
    {
        return investment;
    }

    let (investment_type, fund_name) =
        sniff_legacy(&investment.investment_type, &investment.fund_name);
    investment.investment_type = investment_type;
    investment.fund_name = fund_name;
    investment.schema_version = Some(CURRENT_SCHEMA_VERSION);
    investment
}

/// Map an untagged `(type, fund_name)` pair onto the current vocabulary.
fn sniff_legacy(investment_type: &InvestmentType, fund_name: &str) -> (InvestmentType, String) {
    match investment_type.as_str() {
        LEGACY_SILVER => {
            let name = if fund_name.contains("Gümüş") || fund_name == "GTZ" {
                SILVER_FUND.to_string()
            } else {
                fund_name.to_string()
            };
            (InvestmentType::Fund, name)
        }
        LEGACY_GOLD => {
            if fund_name.contains(GOLD_FUND) || fund_name.contains("GTA") {
                (InvestmentType::Fund, GOLD_FUND.to_string())
            } else if fund_name == "ALT" || fund_name == GOLD {
                (InvestmentType::Currency, GOLD.to_string())
            } else {
                (investment_type.clone(), fund_name.to_string())
            }
        }
        _ if *investment_type == InvestmentType::Currency && fund_name.contains("USD") => {
            (InvestmentType::Currency, DOLLAR.to_string())
        }
        _ => (investment_type.clone(), fund_name.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn legacy(t: &str, name: &str) -> Investment {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let mut inv = Investment::with_id("x", date, InvestmentType::from(t), name, 100.0);
        inv.schema_version = None;
        inv
    }

    #[test]
    fn sniff_rules() {
        let cases = [
            ("gümüş", "GTZ", "fon", "Gümüş Fon"),
            ("gümüş", "Gümüş Katılım", "fon", "Gümüş Fon"),
            ("gümüş", "Başka", "fon", "Başka"),
            ("altın", "GTA Altın", "fon", "Altın Fon"),
            ("altın", "Altın Fon", "fon", "Altın Fon"),
            ("altın", "ALT", "döviz", "Altın"),
            ("altın", "Altın", "döviz", "Altın"),
            ("altın", "Çeyrek", "altın", "Çeyrek"),
            ("döviz", "USD", "döviz", "Dolar"),
            ("döviz", "USD Hesap", "döviz", "Dolar"),
            ("döviz", "EUR", "döviz", "EUR"),
            ("fon", "ALT", "fon", "ALT"),
            ("kripto", "BTC", "kripto", "BTC"),
        ];
        for (old_type, old_name, new_type, new_name) in cases {
            let out = migrate_investment(legacy(old_type, old_name));
            assert_eq!(out.investment_type.as_str(), new_type, "{old_type}/{old_name}");
            assert_eq!(out.fund_name, new_name, "{old_type}/{old_name}");
            assert_eq!(out.schema_version, Some(CURRENT_SCHEMA_VERSION));
        }
    }

    #[test]
    fn tagged_records_are_not_sniffed() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        // A current-schema record may legitimately be named "USD"
        let inv = Investment::with_id("1", date, InvestmentType::Currency, "USD", 10.0);
        assert_eq!(migrate_investment(inv.clone()), inv);
    }
}
