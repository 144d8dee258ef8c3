pub mod activity;

pub use activity::{
    analyze_risk_flags, calculate_wallet_age, count_assets, detect_protocol_interactions,
    last_activity,
};
