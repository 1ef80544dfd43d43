use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Kind of a monetary fact extracted from a broker report.
///
/// Codes are persisted alongside stored reports, so a code is never reused
/// once allocated, even after its kind is retired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i32")]
pub enum CashFlowType {
    /// Cash deposit or withdrawal.
    Cash,
    /// Net price of a security, accrued interest excluded.
    Price,
    AccruedInterest,
    Commission,
    Amortization,
    /// Bond face value redemption.
    Redemption,
    Coupon,
    Dividend,
    /// Derivative variation margin.
    DerivativeProfit,
    /// Margin collateral.
    Margin,
    /// Tax paid.
    Tax,
    ForecastTax,
    /// Derivative trade price.
    DerivativePrice,
}

pub const ALL_CASH_FLOW_TYPES: &[CashFlowType] = &[
    CashFlowType::Cash,
    CashFlowType::Price,
    CashFlowType::AccruedInterest,
    CashFlowType::Commission,
    CashFlowType::Amortization,
    CashFlowType::Redemption,
    CashFlowType::Coupon,
    CashFlowType::Dividend,
    CashFlowType::DerivativeProfit,
    CashFlowType::Margin,
    CashFlowType::Tax,
    CashFlowType::ForecastTax,
    CashFlowType::DerivativePrice,
];

impl CashFlowType {
    pub fn code(&self) -> i32 {
        match self {
            Self::Cash => 0,
            Self::Price => 1,
            Self::AccruedInterest => 2,
            Self::Commission => 3,
            Self::Amortization => 4,
            Self::Redemption => 5,
            Self::Coupon => 6,
            Self::Dividend => 7,
            Self::DerivativeProfit => 8,
            Self::Margin => 9,
            Self::Tax => 10,
            Self::ForecastTax => 11,
            Self::DerivativePrice => 12,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Cash => "Cash deposit/withdrawal",
            Self::Price => "Net price",
            Self::AccruedInterest => "Accrued interest",
            Self::Commission => "Commission",
            Self::Amortization => "Amortization",
            Self::Redemption => "Redemption",
            Self::Coupon => "Coupon",
            Self::Dividend => "Dividend",
            Self::DerivativeProfit => "Variation margin",
            Self::Margin => "Margin collateral",
            Self::Tax => "Tax",
            Self::ForecastTax => "Forecast tax",
            Self::DerivativePrice => "Derivative trade price",
        }
    }

    /// Look up the kind for a stored code. There is no fallback kind.
    pub fn classify(code: i64) -> Result<Self> {
        ALL_CASH_FLOW_TYPES
            .iter()
            .find(|t| i64::from(t.code()) == code)
            .copied()
            .ok_or(Error::UnknownCashFlowCode {
                code,
                report: None,
                position: None,
            })
    }
}

impl TryFrom<i64> for CashFlowType {
    type Error = Error;

    fn try_from(code: i64) -> Result<Self> {
        Self::classify(code)
    }
}

impl From<CashFlowType> for i32 {
    fn from(value: CashFlowType) -> Self {
        value.code()
    }
}

impl fmt::Display for CashFlowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}
