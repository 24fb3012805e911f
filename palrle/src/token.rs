use crate::consts::{ESCAPE_TAG, MAX_INDEX, MAX_RUN, MAX_SHORT_RUN};

/// A run of identical palette indices that fits into a single token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    value: u8,
    len: u8,
}

impl Run {
    /// Returns `None` if `value` is not a valid palette index or `len` is zero.
    pub const fn new(value: u8, len: u8) -> Option<Self> {
        if value > MAX_INDEX || len == 0 {
            return None;
        }
        Some(Self { value, len })
    }

    /// `value` must be at most [`MAX_INDEX`] and `len` non-zero.
    #[inline]
    pub(crate) const fn new_unchecked(value: u8, len: u8) -> Self {
        Self { value, len }
    }

    #[inline]
    pub const fn value(&self) -> u8 {
        self.value
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    /// Picks the token form for this run: short whenever the run fits, escaped otherwise.
    #[inline]
    pub const fn token(&self) -> Token {
        if self.len as usize <= MAX_SHORT_RUN {
            Token::Short([((self.len - 1) << 4) | self.value])
        } else {
            self.escaped_token()
        }
    }

    /// Encodes this run in the escape form, whatever its length.
    #[inline]
    pub const fn escaped_token(&self) -> Token {
        Token::Escape([ESCAPE_TAG | self.value, self.len])
    }

    /// Encodes a run of arbitrary length.
    ///
    /// Runs of up to [`MAX_RUN`] pixels become a single token. Longer runs become consecutive
    /// escaped tokens, including a remainder that would fit the short form.
    pub(crate) fn tokens(value: u8, count: usize) -> impl Iterator<Item = Token> {
        let split = count > MAX_RUN;
        Self::split(value, count).map(move |run| {
            if split {
                run.escaped_token()
            } else {
                run.token()
            }
        })
    }

    /// Splits a run of arbitrary length into token-sized runs of at most [`MAX_RUN`] pixels.
    fn split(value: u8, count: usize) -> impl Iterator<Item = Run> {
        let full = count / MAX_RUN;
        let rest = count % MAX_RUN;

        core::iter::repeat(MAX_RUN)
            .take(full)
            .chain((rest > 0).then_some(rest))
            .map(move |len| Run {
                value,
                len: len as u8,
            })
    }
}

/// The encoded form of a single [`Run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Short([u8; 1]),
    Escape([u8; 2]),
}

impl Token {
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Token::Short(bytes) => bytes,
            Token::Escape(bytes) => bytes,
        }
    }

    /// Number of bytes this token occupies in the stream.
    #[inline]
    pub const fn encoded_len(&self) -> usize {
        match self {
            Token::Short(_) => 1,
            Token::Escape(_) => 2,
        }
    }
}

/// Splits the first byte of a token into its length nibble and palette index.
///
/// Returns `None` as the length for escaped runs, whose length is stored in the next byte.
#[inline(always)]
pub(crate) const fn split_lead_byte(byte: u8) -> (Option<u8>, u8) {
    let value = byte & 0b0000_1111;
    if byte & ESCAPE_TAG == ESCAPE_TAG {
        (None, value)
    } else {
        (Some((byte >> 4) + 1), value)
    }
}
