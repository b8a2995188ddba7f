#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhysicalKey {
    pub base: char,
    pub shifted: char,
}

/// US QWERTY key caps, number row first.
#[derive(Clone, Debug)]
pub struct KeyboardModel {
    pub rows: Vec<Vec<PhysicalKey>>,
}

const QWERTY_ROWS: &[(&str, &str)] = &[
    ("`1234567890-=", "~!@#$%^&*()_+"),
    ("qwertyuiop[]\\", "QWERTYUIOP{}|"),
    ("asdfghjkl;'", "ASDFGHJKL:\""),
    ("zxcvbnm,./", "ZXCVBNM<>?"),
];

impl KeyboardModel {
    pub fn qwerty() -> Self {
        let rows = QWERTY_ROWS
            .iter()
            .map(|(base, shifted)| {
                base.chars()
                    .zip(shifted.chars())
                    .map(|(base, shifted)| PhysicalKey { base, shifted })
                    .collect()
            })
            .collect();
        Self { rows }
    }

    pub fn physical_key_for(&self, ch: char) -> Option<&PhysicalKey> {
        self.find_key_position(ch).map(|(r, c)| &self.rows[r][c])
    }

    /// Row and column of the key cap producing `ch`, shifted or not.
    pub fn find_key_position(&self, ch: char) -> Option<(usize, usize)> {
        self.rows.iter().enumerate().find_map(|(row_idx, row)| {
            row.iter()
                .position(|key| key.base == ch || key.shifted == ch)
                .map(|col_idx| (row_idx, col_idx))
        })
    }
}

impl Default for KeyboardModel {
    fn default() -> Self {
        Self::qwerty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::mapping::SHIFTED_SYMBOLS;

    #[test]
    fn test_qwerty_has_four_rows() {
        let model = KeyboardModel::qwerty();
        assert_eq!(model.rows.len(), 4);
        assert_eq!(model.rows[0].len(), 13);
        assert_eq!(model.rows[1].len(), 13);
        assert_eq!(model.rows[2].len(), 11);
        assert_eq!(model.rows[3].len(), 10);
    }

    #[test]
    fn test_shifted_symbol_table_agrees_with_key_caps() {
        let model = KeyboardModel::qwerty();
        for &(shifted, base) in SHIFTED_SYMBOLS {
            let key = model.physical_key_for(shifted).unwrap();
            assert_eq!(key.base, base, "{shifted}");
            assert_eq!(key.shifted, shifted);
        }
    }

    #[test]
    fn test_find_key_position() {
        let model = KeyboardModel::qwerty();
        assert_eq!(model.find_key_position('a'), Some((2, 0)));
        assert_eq!(model.find_key_position('A'), Some((2, 0)));
        assert_eq!(model.find_key_position(' '), None);
    }
}
