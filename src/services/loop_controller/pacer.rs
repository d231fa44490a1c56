use std::time::Duration;
use tokio::time::Instant;

/// Решение в начале тика
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    /// Слот ещё не наступил: спать остаток бюджета и начать тик заново
    Wait(Duration),
    /// Выполнять работу тика
    Proceed,
}

/// Ограничивает частоту тиков сверху значением 1 / budget.
///
/// Под нагрузкой тики идут реже, но никогда не чаще бюджета.
#[derive(Debug, Clone)]
pub struct Pacer {
    budget: Duration,
    last_tick_start: Option<Instant>,
}

impl Pacer {
    pub fn new(budget: Duration) -> Self {
        Self {
            budget,
            last_tick_start: None,
        }
    }

    pub fn check(&mut self, now: Instant) -> Pace {
        if let Some(last) = self.last_tick_start {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.budget {
                return Pace::Wait(self.budget - elapsed);
            }
        }

        self.last_tick_start = Some(now);
        Pace::Proceed
    }
}
