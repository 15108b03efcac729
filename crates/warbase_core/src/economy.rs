//! Resource stockpiles, construction costs and daily income.
//!
//! Each faction owns one general bucket and six category buckets, one per
//! factory type. A piece is paid from its own category first; any shortfall is
//! borrowed from the general bucket. Every bucket saturates at
//! [`RESOURCE_CAP`].
//!
//! All calculations use integer math for deterministic simulation.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::pieces::PieceSet;

/// Maximum value of any resource bucket.
pub const RESOURCE_CAP: u8 = 99;

/// General resource gained per owned warbase at each day rollover.
pub const WARBASE_DAILY_INCOME: u8 = 5;

/// Category resource gained per owned factory at each day rollover.
pub const FACTORY_DAILY_INCOME: u8 = 2;

/// Minimum general reserve before the computer faction borrows from it.
pub const AI_MIN_GENERAL_SPEND: u8 = 11;

/// Factory / resource category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceCategory {
    /// Pays for electronics.
    Electronics,
    /// Pays for nuclear warheads.
    Nuclear,
    /// Pays for phasers.
    Phasers,
    /// Pays for missiles.
    Missiles,
    /// Pays for cannons.
    Cannon,
    /// Pays for all chassis types.
    Chassis,
}

impl ResourceCategory {
    /// All categories in table order.
    pub const ALL: [Self; 6] = [
        Self::Electronics,
        Self::Nuclear,
        Self::Phasers,
        Self::Missiles,
        Self::Cannon,
        Self::Chassis,
    ];

    /// Table index (also the factory subtype code).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Electronics => 0,
            Self::Nuclear => 1,
            Self::Phasers => 2,
            Self::Missiles => 3,
            Self::Cannon => 4,
            Self::Chassis => 5,
        }
    }

    /// Inverse of [`Self::index`].
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Electronics),
            1 => Some(Self::Nuclear),
            2 => Some(Self::Phasers),
            3 => Some(Self::Missiles),
            4 => Some(Self::Cannon),
            5 => Some(Self::Chassis),
            _ => None,
        }
    }
}

/// How much the general bucket may cover for a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowPolicy {
    /// The human player may spend the whole general reserve.
    Unlimited,
    /// The computer spends at most half the reserve, and only from
    /// [`AI_MIN_GENERAL_SPEND`] up.
    HalfReserve,
}

/// A faction's stockpile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Resources {
    /// General resource, earned from warbases.
    pub general: u8,
    /// Category resources indexed by [`ResourceCategory::index`].
    pub categories: [u8; 6],
}

/// Amounts to deduct for one purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Payment {
    /// Deducted from the general bucket.
    pub general: u8,
    /// Deducted per category.
    pub categories: [u8; 6],
}

impl Resources {
    /// Create a stockpile with only general resource.
    #[must_use]
    pub const fn with_general(general: u8) -> Self {
        Self {
            general,
            categories: [0; 6],
        }
    }

    /// Amount held in one category.
    #[must_use]
    pub const fn category(&self, category: ResourceCategory) -> u8 {
        self.categories[category.index()]
    }

    /// Work out how a piece set would be paid for.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InsufficientResources`] when the borrowed
    /// shortfall exceeds what the policy allows.
    pub fn plan_payment(&self, pieces: PieceSet, policy: BorrowPolicy) -> Result<Payment> {
        let mut payment = Payment::default();
        let mut available = self.categories;
        let mut shortfall: u16 = 0;

        for piece in pieces.iter() {
            let index = piece.category().index();
            let from_category = piece.cost().min(available[index]);
            available[index] -= from_category;
            payment.categories[index] += from_category;
            shortfall += u16::from(piece.cost() - from_category);
        }

        let limit = match policy {
            BorrowPolicy::Unlimited => u16::from(self.general),
            BorrowPolicy::HalfReserve if shortfall == 0 => 0,
            BorrowPolicy::HalfReserve if self.general < AI_MIN_GENERAL_SPEND => 0,
            BorrowPolicy::HalfReserve => u16::from(self.general / 2),
        };

        if shortfall > limit {
            return Err(EngineError::InsufficientResources {
                category: None,
                required: shortfall.min(u16::from(u8::MAX)) as u8,
                available: limit as u8,
            });
        }

        payment.general = shortfall as u8;
        Ok(payment)
    }

    /// Deduct a planned payment.
    pub fn apply_payment(&mut self, payment: &Payment) {
        self.general = self.general.saturating_sub(payment.general);
        for (held, paid) in self.categories.iter_mut().zip(payment.categories) {
            *held = held.saturating_sub(paid);
        }
    }

    /// Plan and deduct in one step.
    ///
    /// # Errors
    ///
    /// Same as [`Self::plan_payment`]; nothing is deducted on error.
    pub fn spend(&mut self, pieces: PieceSet, policy: BorrowPolicy) -> Result<Payment> {
        let payment = self.plan_payment(pieces, policy)?;
        self.apply_payment(&payment);
        Ok(payment)
    }

    /// Day-rollover income for the given holdings.
    pub fn collect_income(&mut self, warbases: u8, factories: &[u8; 6]) {
        self.general = add_capped(self.general, warbases.saturating_mul(WARBASE_DAILY_INCOME));
        for (held, owned) in self.categories.iter_mut().zip(factories) {
            *held = add_capped(*held, owned.saturating_mul(FACTORY_DAILY_INCOME));
        }
    }
}

fn add_capped(held: u8, gain: u8) -> u8 {
    held.saturating_add(gain).min(RESOURCE_CAP)
}
