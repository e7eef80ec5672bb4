//! Combat resolution.
//!
//! Pure functions and small state holders for contact damage, weapon damage,
//! elite scaling and knockback. Deciding *whether* a hit happens belongs to
//! the authoritative agent; everything here is safe to run on any instance.
//!
//! # Core Functions
//!
//! - `scale_for_elite`: elite multiplier, applied exactly once
//! - `resolve_damage`: health reduction (clamped to 0)
//! - `knockback_direction`: push direction with a seeded fallback
//! - `ContactCooldowns`: per attacker/target contact gating
//! - `Knockback`: linear damping ramp

pub mod contact;
pub mod damage;
pub mod knockback;

pub use contact::ContactCooldowns;
pub use damage::{DamageOutcome, resolve_damage, sanitize_amount, scale_for_elite};
pub use knockback::{DEGENERATE_EPSILON, Knockback, KnockbackDirection, knockback_direction};
