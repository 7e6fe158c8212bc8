use fxhash::FxHashSet;
use sdl2::keyboard::Keycode;

/// The current state of the keyboard.
#[derive(Default)]
pub struct KeyboardState {
    pub down: FxHashSet<Keycode>,
    pub pressed: FxHashSet<Keycode>,
}

impl KeyboardState {
    /// Forgets this frame's presses. Held keys stay down.
    pub fn begin_frame(&mut self) {
        self.pressed.clear();
    }

    pub fn key_down(&mut self, keycode: Keycode) {
        self.down.insert(keycode);
        self.pressed.insert(keycode);
    }

    pub fn key_up(&mut self, keycode: Keycode) {
        self.down.remove(&keycode);
    }

    pub fn is_down(&self, keycode: Keycode) -> bool {
        self.down.contains(&keycode)
    }

    /// -1, 0 or 1 depending on which of the two keys are held.
    pub fn axis(&self, negative: Keycode, positive: Keycode) -> f32 {
        self.is_down(positive) as i32 as f32 - self.is_down(negative) as i32 as f32
    }
}

/// One-shot commands bound to a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SelectNext,
    AddQuad,
    AddCube,
    AddCubeFaces,
    RemoveSelected,
    SlowerRotation,
    FasterRotation,
    DimObjects,
    BrightenObjects,
    DimBackground,
    BrightenBackground,
    ResetAll,
    Quit,
}

impl Action {
    pub fn from_keycode(keycode: Keycode) -> Option<Self> {
        let action = match keycode {
            Keycode::Tab => Action::SelectNext,
            Keycode::N => Action::AddQuad,
            Keycode::C => Action::AddCube,
            Keycode::F => Action::AddCubeFaces,
            Keycode::Delete | Keycode::Backspace => Action::RemoveSelected,
            Keycode::Q => Action::SlowerRotation,
            Keycode::E => Action::FasterRotation,
            Keycode::Num1 => Action::DimObjects,
            Keycode::Num2 => Action::BrightenObjects,
            Keycode::Num3 => Action::DimBackground,
            Keycode::Num4 => Action::BrightenBackground,
            Keycode::R => Action::ResetAll,
            Keycode::Escape => Action::Quit,
            _ => return None,
        };
        Some(action)
    }
}
