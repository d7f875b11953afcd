use std::fmt;

/// A recognizable sign: Cyrillic fingerspelling letters, digits, and the
/// "cat" word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    A,
    Be,
    Ve,
    Ge,
    De,
    Ye,
    Yo,
    Zhe,
    Ze,
    Zero,
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Cat,
}

impl Symbol {
    /// Label emitted on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "А",
            Self::Be => "Б",
            Self::Ve => "В",
            Self::Ge => "Г",
            Self::De => "Д",
            Self::Ye => "Е",
            Self::Yo => "Ё",
            Self::Zhe => "Ж",
            Self::Ze => "З",
            Self::Zero => "0",
            Self::One => "1",
            Self::Two => "2",
            Self::Three => "3",
            Self::Four => "4",
            Self::Five => "5",
            Self::Six => "6",
            Self::Seven => "7",
            Self::Eight => "8",
            Self::Nine => "9",
            Self::Cat => "КОШКА",
        }
    }

}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
