/// ## Variable memory
///
/// One signed 16-bit slot per letter, `A` through `Z`.

pub const VAR_COUNT: usize = 26;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Var {
    slots: [i16; VAR_COUNT],
}

impl Var {
    pub fn new() -> Var {
        Var::default()
    }

    pub fn clear(&mut self) {
        self.slots = [0; VAR_COUNT];
    }

    pub fn fetch(&self, var: u8) -> i16 {
        self.slots.get(usize::from(var)).copied().unwrap_or(0)
    }

    pub fn store(&mut self, var: u8, value: i16) {
        if let Some(slot) = self.slots.get_mut(usize::from(var)) {
            *slot = value;
        } else {
            debug_assert!(false, "No variable slot {}.", var);
        }
    }

    pub fn name(var: u8) -> char {
        char::from(b'A' + var)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_fetch_clear() {
        let mut v = Var::new();
        v.store(25, -7);
        assert_eq!(v.fetch(25), -7);
        assert_eq!(Var::name(25), 'Z');
        v.clear();
        assert_eq!(v.fetch(25), 0);
    }
}
