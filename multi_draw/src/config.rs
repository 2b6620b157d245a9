// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::draw::{DrawForm, UnknownDrawForm};
use thiserror::Error;

/// A configuration value wasn't recognized.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// See [`DrawForm::as_str`] for valid names.
    #[error(transparent)]
    DrawForm(#[from] UnknownDrawForm),
    /// Valid swap modes are `explicit` and `implicit`.
    #[error("unknown swap mode {0:?}")]
    Swap(String),
}

/// How the scene is drawn and presented.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SceneConfig {
    /// The draw call to test.
    pub draw_form: DrawForm,
    /// Commit the frame manually after drawing, instead of letting the browser present it.
    pub explicit_swap: bool,
}

impl Default for SceneConfig {
    /// Chosen by cargo features. If more than one draw form is enabled the first of
    /// [`DrawForm::ALL`] wins.
    fn default() -> Self {
        Self {
            draw_form: draw_form_from_flags([
                cfg!(feature = "multi_draw_arrays"),
                cfg!(feature = "multi_draw_arrays_instanced"),
                cfg!(feature = "multi_draw_elements"),
                cfg!(feature = "multi_draw_elements_instanced"),
            ]),
            explicit_swap: cfg!(feature = "explicit_swap"),
        }
    }
}

/// Picks the first enabled batched form, in [`DrawForm::ALL`] order, or [`DrawForm::Plain`] if
/// none are enabled.
fn draw_form_from_flags(enabled: [bool; 4]) -> DrawForm {
    enabled
        .into_iter()
        .zip(&DrawForm::ALL[1..])
        .find_map(|(enabled, &form)| enabled.then_some(form))
        .unwrap_or_default()
}

impl SceneConfig {
    /// Overrides the configuration with optional runtime values, e.g. from a URL query.
    pub fn with_overrides(
        mut self,
        draw_form: Option<&str>,
        swap: Option<&str>,
    ) -> Result<Self, ConfigError> {
        if let Some(draw_form) = draw_form {
            self.draw_form = draw_form.parse()?;
        }
        if let Some(swap) = swap {
            self.explicit_swap = match swap {
                "explicit" => true,
                "implicit" => false,
                _ => return Err(ConfigError::Swap(swap.to_owned())),
            };
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let config = SceneConfig {
            draw_form: DrawForm::Plain,
            explicit_swap: false,
        };

        assert_eq!(config.with_overrides(None, None), Ok(config));
        assert_eq!(
            config.with_overrides(Some("multi_draw_arrays_instanced"), Some("explicit")),
            Ok(SceneConfig {
                draw_form: DrawForm::MultiArraysInstanced,
                explicit_swap: true,
            })
        );
        assert_eq!(
            config.with_overrides(None, Some("sometimes")),
            Err(ConfigError::Swap("sometimes".into()))
        );
        assert!(matches!(
            config.with_overrides(Some("triangle_fan"), None),
            Err(ConfigError::DrawForm(_))
        ));
    }

    #[test]
    fn test_default_from_features() {
        assert_eq!(
            SceneConfig::default().explicit_swap,
            cfg!(feature = "explicit_swap")
        );
    }

    #[test]
    fn test_draw_form_priority() {
        assert_eq!(draw_form_from_flags([false; 4]), DrawForm::Plain);
        assert_eq!(
            draw_form_from_flags([false, true, true, false]),
            DrawForm::MultiArraysInstanced
        );
        assert_eq!(draw_form_from_flags([true; 4]), DrawForm::MultiArrays);
        assert_eq!(
            draw_form_from_flags([false, false, false, true]),
            DrawForm::MultiElementsInstanced
        );
    }
}
