//! Budget reservations for the children of a layout.

use crate::sizing::Sizing;

/// Per-child reservations and render order computed before a layout renders.
///
/// Proportional and fixed children reserve budget up front: proportional
/// shares are floored, and every reservation is clamped to what is still
/// unreserved, so the reservations never sum above the container budget.
/// Required children reserve first, then optional ones, each group in
/// declaration order. Automatic children reserve nothing and draw on what is
/// left when their turn comes.
///
/// Children render in the same priority order: every required child before
/// any optional one. An optional child therefore only ever sees budget the
/// required children left over.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllocationPlan {
    reservations: Vec<Option<usize>>,
    required: Vec<bool>,
}

impl AllocationPlan {
    /// Computes reservations for children described by `(sizing, required)`.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn new(children: &[(Sizing, bool)], max_tokens: usize) -> Self {
        let mut reservations = vec![None; children.len()];
        let mut unreserved = max_tokens;

        for required_pass in [true, false] {
            for (idx, &(sizing, required)) in children.iter().enumerate() {
                if required != required_pass {
                    continue;
                }

                let wanted = match sizing {
                    Sizing::Auto => continue,
                    Sizing::Proportional(fraction) => (fraction * max_tokens as f64).floor() as usize,
                    Sizing::Fixed(count) => count,
                };
                let reserved = wanted.min(unreserved);
                unreserved -= reserved;
                reservations[idx] = Some(reserved);
            }
        }

        Self {
            reservations,
            required: children.iter().map(|&(_, required)| required).collect(),
        }
    }

    /// Reservation of a child, `None` for automatic children.
    #[must_use]
    pub fn reservation(&self, index: usize) -> Option<usize> {
        self.reservations.get(index).copied().flatten()
    }

    /// Sum of all reservations.
    #[must_use]
    pub fn total_reserved(&self) -> usize {
        self.reservations.iter().flatten().sum()
    }

    /// Child indices in render order: required children, then optional
    /// ones, each in declaration order.
    #[must_use]
    pub fn render_order(&self) -> Vec<usize> {
        let required = (0..self.required.len()).filter(|&idx| self.required[idx]);
        let optional = (0..self.required.len()).filter(|&idx| !self.required[idx]);
        required.chain(optional).collect()
    }

    /// Sum of reservations held by children rendered after `index` in the
    /// same priority group.
    #[must_use]
    pub fn reserved_after(&self, index: usize) -> usize {
        self.peers_after(index)
            .filter_map(|idx| self.reservations[idx])
            .sum()
    }

    /// Number of automatic children at or after `index` in the same
    /// priority group.
    #[must_use]
    pub fn automatic_from(&self, index: usize) -> usize {
        let own = self.reservations.get(index).is_some_and(Option::is_none);
        let later = self
            .peers_after(index)
            .filter(|&idx| self.reservations[idx].is_none())
            .count();
        usize::from(own) + later
    }

    /// Budget handed to child `index` when `available` tokens remain.
    ///
    /// `available` may be negative after a required child overflowed.
    /// Reserved children get their reservation, limited to what is left.
    /// Automatic children get what remains after the reservations of later
    /// siblings in their priority group; an optional automatic child shares
    /// that evenly with the optional automatic siblings still to render,
    /// while a required one may take all of it.
    #[must_use]
    pub fn budget_for(&self, index: usize, available: i64) -> usize {
        let available = clamp_to_usize(available);
        if let Some(reserved) = self.reservation(index) {
            return reserved.min(available);
        }

        let open = available.saturating_sub(self.reserved_after(index));
        if self.is_required(index) {
            open
        } else {
            open / self.automatic_from(index).max(1)
        }
    }

    fn is_required(&self, index: usize) -> bool {
        self.required.get(index).copied().unwrap_or(false)
    }

    fn peers_after(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        let group = self.is_required(index);
        (index + 1..self.required.len()).filter(move |&idx| self.required[idx] == group)
    }
}

fn clamp_to_usize(value: i64) -> usize {
    usize::try_from(value.max(0)).unwrap_or(usize::MAX)
}
