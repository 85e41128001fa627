//! Menu and screen navigation
//!
//! The UI is either viewing one screen or moving a cursor through the
//! menu - one enum, no loosely coupled flags. Rotation while viewing the
//! home screen is a setpoint edit and is handled by the caller (it needs
//! shared state); rotation anywhere else belongs to the enum here.

use super::mode::Mode;

/// Screens reachable from the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Screen {
    #[default]
    Home,
    GraphSetpoint,
    GraphLine,
    GraphBar,
    TempWattsLine,
    WattsLine,
    PiTemperature,
    DisplayContrast,
}

impl Screen {
    pub fn label(&self) -> &'static str {
        match self {
            Screen::Home => "Home Screen",
            Screen::GraphSetpoint => "Graph Setpoint",
            Screen::GraphLine => "Graph Line",
            Screen::GraphBar => "Graph Bar",
            Screen::TempWattsLine => "Temp Watts Line",
            Screen::WattsLine => "Watts Line",
            Screen::PiTemperature => "PI Temperature",
            Screen::DisplayContrast => "Display Contrast",
        }
    }
}

/// One selectable menu row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuItem {
    Show(Screen),
    SetMode(Mode),
}

impl MenuItem {
    pub fn label(&self) -> &'static str {
        match self {
            MenuItem::Show(screen) => screen.label(),
            MenuItem::SetMode(Mode::Off) => "Heater Off",
            MenuItem::SetMode(Mode::Manual) => "Manual Mode",
            MenuItem::SetMode(Mode::Session) => "Start Session",
        }
    }
}

/// Everything the user can select, in display order.
pub const MENU_ITEMS: [MenuItem; 11] = [
    MenuItem::Show(Screen::Home),
    MenuItem::SetMode(Mode::Session),
    MenuItem::SetMode(Mode::Manual),
    MenuItem::SetMode(Mode::Off),
    MenuItem::Show(Screen::GraphSetpoint),
    MenuItem::Show(Screen::GraphLine),
    MenuItem::Show(Screen::GraphBar),
    MenuItem::Show(Screen::TempWattsLine),
    MenuItem::Show(Screen::WattsLine),
    MenuItem::Show(Screen::PiTemperature),
    MenuItem::Show(Screen::DisplayContrast),
];

/// One detent of the rotary encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RotaryStep {
    Cw,
    Ccw,
}

/// UI navigation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UiMode {
    Viewing(Screen),
    InMenu { cursor: usize },
}

impl Default for UiMode {
    fn default() -> Self {
        UiMode::Viewing(Screen::Home)
    }
}

impl UiMode {
    /// Handle a button click.
    ///
    /// Viewing any screen: open the menu with the cursor at the top.
    /// In the menu: select the row under the cursor; screen rows switch
    /// the view, mode rows return to Home and hand the action back to
    /// the caller.
    pub fn click(&mut self) -> Option<MenuItem> {
        match *self {
            UiMode::Viewing(_) => {
                *self = UiMode::InMenu { cursor: 0 };
                None
            }
            UiMode::InMenu { cursor } => {
                let item = MENU_ITEMS[cursor];
                *self = match item {
                    MenuItem::Show(screen) => UiMode::Viewing(screen),
                    MenuItem::SetMode(_) => UiMode::Viewing(Screen::Home),
                };
                Some(item)
            }
        }
    }

    /// Handle a rotary detent.
    ///
    /// Returns true if the event was consumed by menu navigation; false
    /// means the caller owns it (setpoint or contrast edit).
    pub fn rotate(&mut self, step: RotaryStep) -> bool {
        match self {
            UiMode::InMenu { cursor } => {
                *cursor = match step {
                    RotaryStep::Cw => (*cursor + 1) % MENU_ITEMS.len(),
                    RotaryStep::Ccw => cursor.checked_sub(1).unwrap_or(MENU_ITEMS.len() - 1),
                };
                true
            }
            UiMode::Viewing(_) => false,
        }
    }

    /// Screen currently on the glass (the menu overlays the last one).
    pub fn screen(&self) -> Option<Screen> {
        match self {
            UiMode::Viewing(screen) => Some(*screen),
            UiMode::InMenu { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_opens_menu_then_selects() {
        let mut ui = UiMode::default();
        assert_eq!(ui.click(), None);
        assert_eq!(ui, UiMode::InMenu { cursor: 0 });

        // Cursor 0 is the home screen row.
        assert_eq!(ui.click(), Some(MenuItem::Show(Screen::Home)));
        assert_eq!(ui, UiMode::Viewing(Screen::Home));
    }

    #[test]
    fn rotation_moves_cursor_and_wraps() {
        let mut ui = UiMode::InMenu { cursor: 0 };
        assert!(ui.rotate(RotaryStep::Ccw));
        assert_eq!(
            ui,
            UiMode::InMenu {
                cursor: MENU_ITEMS.len() - 1
            }
        );
        assert!(ui.rotate(RotaryStep::Cw));
        assert_eq!(ui, UiMode::InMenu { cursor: 0 });
    }

    #[test]
    fn rotation_while_viewing_is_left_to_caller() {
        let mut ui = UiMode::Viewing(Screen::Home);
        assert!(!ui.rotate(RotaryStep::Cw));
        assert_eq!(ui, UiMode::Viewing(Screen::Home));
    }

    #[test]
    fn mode_rows_return_to_home() {
        let mut ui = UiMode::InMenu { cursor: 1 };
        let selected = ui.click();
        assert_eq!(selected, Some(MenuItem::SetMode(Mode::Session)));
        assert_eq!(ui, UiMode::Viewing(Screen::Home));
    }

    #[test]
    fn every_item_has_a_label() {
        for item in MENU_ITEMS {
            assert!(!item.label().is_empty());
        }
    }
}
