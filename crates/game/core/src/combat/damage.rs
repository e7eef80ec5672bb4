//! Damage math.

// ============================================================================
// Elite Scaling
// ============================================================================

/// Scales an amount by the elite multiplier exactly once.
///
/// Non-elite agents pass the amount through unchanged.
pub fn scale_for_elite(amount: f32, is_elite: bool, multiplier: f32) -> f32 {
    let amount = sanitize_amount(amount);
    if is_elite { amount * multiplier } else { amount }
}

/// Treats non-finite and negative amounts as zero.
///
/// Damage never heals, and a malformed amount from a collaborator must not
/// poison the health value.
pub fn sanitize_amount(amount: f32) -> f32 {
    if amount.is_finite() && amount > 0.0 {
        amount
    } else {
        0.0
    }
}

// ============================================================================
// Application
// ============================================================================

/// Result of applying an amount to a health value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageOutcome {
    /// Amount actually applied after sanitizing.
    pub amount: f32,
    /// Health after application, clamped to zero.
    pub resulting_health: f32,
    /// Whether the hit takes health to zero.
    pub will_destroy: bool,
}

/// Applies `amount` to `current` health.
///
/// Health only moves down; the result is clamped at zero, and zero means
/// destroyed.
pub fn resolve_damage(current: f32, amount: f32) -> DamageOutcome {
    let amount = sanitize_amount(amount);
    let resulting_health = (current - amount).max(0.0);

    DamageOutcome {
        amount,
        resulting_health,
        will_destroy: resulting_health <= 0.0,
    }
}
