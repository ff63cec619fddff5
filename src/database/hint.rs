//! Per-instruction operand displacement and label-resolution hints.

/// How an operand's value should be resolved to a label.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LabelPolicy {
    /// Resolve automatically via [`crate::database::Database::get_operand_label`].
    #[default]
    Auto,
    /// Never resolve to a label; always render the bare numeric value.
    None,
    /// Prefer the named label if it covers the operand's base address.
    Named(String),
}

/// The displacement and label policy attached to one address's operand.
#[derive(Debug, Clone, Default)]
pub struct OperandHint {
    pub disp: i32,
    pub label_policy: LabelPolicy,
}

impl OperandHint {
    pub fn is_default(&self) -> bool {
        self.disp == 0 && self.label_policy == LabelPolicy::Auto
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_hint_is_default() {
        assert!(OperandHint::default().is_default());
    }

    #[test]
    fn nonzero_disp_is_not_default() {
        let hint = OperandHint {
            disp: -1,
            ..Default::default()
        };
        assert!(!hint.is_default());
    }
}
