use std::fmt;

/// Why an intent left the world untouched. None of these are faults; the
/// caller drops them, at most telling the requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    UnknownItem,
    NotHeld,
    OutOfRange,
    InsufficientFunds,
    NotUsable,
    NoCampfire,
    UnknownEntity,
    Cooldown,
    Invalid,
}

impl Rejection {
    /// Private notice for the requester, for the rejections worth explaining.
    pub fn notice(self) -> Option<(&'static str, &'static str)> {
        match self {
            Rejection::InsufficientFunds => Some(("Trader", "You cannot afford that.")),
            Rejection::NoCampfire => Some(("System", "You need to be near a campfire to cook.")),
            _ => None,
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Rejection::UnknownItem => "unknown item",
            Rejection::NotHeld => "item not held",
            Rejection::OutOfRange => "out of range",
            Rejection::InsufficientFunds => "insufficient funds",
            Rejection::NotUsable => "item not usable",
            Rejection::NoCampfire => "no campfire nearby",
            Rejection::UnknownEntity => "unknown entity",
            Rejection::Cooldown => "on cooldown",
            Rejection::Invalid => "invalid request",
        };
        f.write_str(text)
    }
}
