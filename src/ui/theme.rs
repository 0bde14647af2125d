//! cliclack colors

use cliclack::ThemeState;
use console::Style;

/// Magenta frame, red on error
#[derive(Debug, Clone, Copy, Default)]
pub struct DotpulseTheme;

impl cliclack::Theme for DotpulseTheme {
    fn bar_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => Style::new().magenta(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => Style::new().magenta().dim(),
        }
    }

    fn state_symbol_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Submit => Style::new().green(),
            _ => self.bar_color(state),
        }
    }
}

/// Install the theme for every later prompt
pub fn init_theme() {
    cliclack::set_theme(DotpulseTheme);
}
