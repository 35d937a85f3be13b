//! Enter/Tab submit shortcut rules, kept free of DOM types.

use crate::stage::Stage;

/// A `keydown` as far as the shortcut cares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyPress<'a> {
    pub key: &'a str,
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
}

impl<'a> KeyPress<'a> {
    pub fn plain(key: &'a str) -> Self {
        Self {
            key,
            ..Self::default()
        }
    }

    /// Enter or Tab with no modifier held.
    pub fn is_submit(&self) -> bool {
        matches!(self.key, "Enter" | "Tab") && !(self.shift || self.alt || self.ctrl || self.meta)
    }
}

/// What to do with the installed key listener after a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rebind {
    Keep,
    /// Remove the current listener (if any) and bind this stage's form.
    Replace(Stage),
    /// Remove the current listener; the stage has no form.
    Drop,
}

/// Decides the listener change for rendering `stage` while `bound` holds it.
pub fn rebind(bound: Option<Stage>, stage: Stage) -> Rebind {
    let wanted = stage.form_index().map(|_| stage);
    match (bound, wanted) {
        (current, wanted) if current == wanted => Rebind::Keep,
        (_, Some(stage)) => Rebind::Replace(stage),
        (_, None) => Rebind::Drop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_and_tab_submit_without_modifiers() {
        assert!(KeyPress::plain("Enter").is_submit());
        assert!(KeyPress::plain("Tab").is_submit());
        assert!(!KeyPress::plain("a").is_submit());
        assert!(!KeyPress::plain("Escape").is_submit());
    }

    #[test]
    fn any_modifier_leaves_the_key_alone() {
        let modified = [
            KeyPress {
                shift: true,
                ..KeyPress::plain("Tab")
            },
            KeyPress {
                alt: true,
                ..KeyPress::plain("Enter")
            },
            KeyPress {
                ctrl: true,
                ..KeyPress::plain("Enter")
            },
            KeyPress {
                meta: true,
                ..KeyPress::plain("Tab")
            },
        ];
        for press in modified {
            assert!(!press.is_submit(), "{press:?}");
        }
    }

    #[test]
    fn binding_follows_each_stage_change() {
        let mut bound = None;
        let mut decisions = Vec::new();
        for stage in [
            Stage::Connect,
            Stage::Capacity,
            Stage::ChainFee,
            Stage::Payment,
            Stage::AwaitingChannel,
            Stage::Done,
        ] {
            let decision = rebind(bound, stage);
            bound = match decision {
                Rebind::Keep => bound,
                Rebind::Replace(stage) => Some(stage),
                Rebind::Drop => None,
            };
            decisions.push(decision);
        }

        assert_eq!(
            decisions,
            vec![
                Rebind::Replace(Stage::Connect),
                Rebind::Replace(Stage::Capacity),
                Rebind::Replace(Stage::ChainFee),
                Rebind::Replace(Stage::Payment),
                Rebind::Drop,
                Rebind::Keep,
            ]
        );
        assert_eq!(bound, None);
    }

    #[test]
    fn rerender_of_same_stage_keeps_the_listener() {
        assert_eq!(rebind(Some(Stage::Capacity), Stage::Capacity), Rebind::Keep);
        assert_eq!(rebind(None, Stage::Done), Rebind::Keep);
    }
}
