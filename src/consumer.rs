//! The action performed on each emitted token.

use std::error::Error;

/// Error returned by a consumption action.
pub type ConsumeError = Box<dyn Error + Send + Sync>;

/// One token leaving a feed.
#[derive(Debug)]
pub struct Emission<'a, T> {
    /// 1-based round number.
    pub round: usize,
    /// Index of the feed in registration order.
    pub feed: usize,
    /// Label of the feed (the source location for directory feeds).
    pub label: &'a str,
    pub token: &'a T,
    /// Quota drawn for this feed in this round.
    pub quota: u32,
    /// 0-based position of this token within the feed's draw.
    pub slot: usize,
}

/// Receives every emitted token, in draw order.
///
/// `announce` runs first; it is where emissions get reported. If it fails the
/// report channel is gone and the run always stops, whatever the failure
/// policy. `consume` then performs the action itself. The scheduler waits for
/// it to return before drawing the next token.
pub trait Consumer<T> {
    fn announce(&mut self, _emission: &Emission<'_, T>) -> Result<(), ConsumeError> {
        Ok(())
    }

    fn consume(&mut self, emission: &Emission<'_, T>) -> Result<(), ConsumeError>;
}

impl<T, C: Consumer<T> + ?Sized> Consumer<T> for &mut C {
    fn announce(&mut self, emission: &Emission<'_, T>) -> Result<(), ConsumeError> {
        (**self).announce(emission)
    }

    fn consume(&mut self, emission: &Emission<'_, T>) -> Result<(), ConsumeError> {
        (**self).consume(emission)
    }
}

impl<T, C: Consumer<T> + ?Sized> Consumer<T> for Box<C> {
    fn announce(&mut self, emission: &Emission<'_, T>) -> Result<(), ConsumeError> {
        (**self).announce(emission)
    }

    fn consume(&mut self, emission: &Emission<'_, T>) -> Result<(), ConsumeError> {
        (**self).consume(emission)
    }
}

/// Consumer built from a closure; see [`from_fn`].
pub struct FnConsumer<F>(F);

impl<T, F> Consumer<T> for FnConsumer<F>
where
    F: FnMut(&Emission<'_, T>) -> Result<(), ConsumeError>,
{
    fn consume(&mut self, emission: &Emission<'_, T>) -> Result<(), ConsumeError> {
        (self.0)(emission)
    }
}

/// Wrap a closure as a consumer.
pub fn from_fn<T, F>(f: F) -> FnConsumer<F>
where
    F: FnMut(&Emission<'_, T>) -> Result<(), ConsumeError>,
{
    FnConsumer(f)
}

/// Accepts every token and does nothing with it.
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl<T> Consumer<T> for Discard {
    fn consume(&mut self, _emission: &Emission<'_, T>) -> Result<(), ConsumeError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emission<'a>(label: &'a str, token: &'a u32) -> Emission<'a, u32> {
        Emission {
            round: 1,
            feed: 0,
            label,
            token,
            quota: 1,
            slot: 0,
        }
    }

    #[test]
    fn test_from_fn_forwards_result() {
        let mut seen = Vec::new();
        {
            let mut consumer = from_fn(|e: &Emission<'_, u32>| {
                seen.push(*e.token);
                if *e.token == 13 {
                    Err("unlucky".into())
                } else {
                    Ok(())
                }
            });
            assert!(consumer.consume(&emission("a", &1)).is_ok());
            assert!(consumer.consume(&emission("a", &13)).is_err());
        }
        assert_eq!(seen, vec![1, 13]);
    }

    #[test]
    fn test_discard_accepts_everything() {
        let mut consumer = Discard;
        assert!(Consumer::<u32>::announce(&mut consumer, &emission("a", &7)).is_ok());
        assert!(Consumer::<u32>::consume(&mut consumer, &emission("a", &7)).is_ok());
    }

    #[test]
    fn test_boxed_consumer() {
        let mut boxed: Box<dyn Consumer<u32>> = Box::new(Discard);
        assert!(boxed.consume(&emission("a", &7)).is_ok());
    }
}
