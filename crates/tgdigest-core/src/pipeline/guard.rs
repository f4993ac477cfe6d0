/// Platform message-size ceiling, counted in UTF-16 code units as Telegram does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LengthGuard {
    ceiling: usize,
}

impl LengthGuard {
    pub fn new(ceiling: usize) -> Self {
        Self { ceiling }
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    pub fn measure(text: &str) -> usize {
        text.encode_utf16().count()
    }

    /// `true` iff the text can be sent as one message.
    pub fn allows(&self, text: &str) -> bool {
        Self::measure(text) <= self.ceiling
    }
}
