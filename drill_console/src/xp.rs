use tracing::info;

/// Charged when a failed drill is accepted as-is.
pub const FAILURE_PENALTY_XP: i64 = 100;
/// Charged for restarting a failed drill.
pub const RETRY_COST_XP: i64 = 10;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct XpLedger {
    balance: i64,
}

impl XpLedger {
    pub fn new(balance: i64) -> Self {
        Self { balance }
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    pub fn charge(&mut self, amount: i64, reason: &'static str) -> i64 {
        self.balance -= amount;
        info!(
            target: "drill::console",
            amount,
            reason,
            balance = self.balance,
            "xp.charged"
        );
        self.balance
    }
}
