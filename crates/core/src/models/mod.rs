pub mod analytics;
pub mod chart;
pub mod fund_value;
pub mod investment;
pub mod price;
pub mod settings;
