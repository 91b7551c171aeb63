use std::collections::VecDeque;

use crate::config::Variation;

/// Fixed-capacity ring buffer holding the most recent readings of one variable.
#[derive(Debug, Clone)]
pub struct PersistenceWindow {
    capacity: usize,
    values: VecDeque<Option<f64>>,
}

impl PersistenceWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, value: Option<f64>) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `None` until the window has seen `capacity` readings.
    pub fn is_stuck(&self, variation: &Variation) -> Option<bool> {
        if !self.is_full() {
            return None;
        }
        Some(variation.is_stuck(self.values.iter().copied()))
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_slides() {
        let mut window = PersistenceWindow::new(3);
        window.push(Some(1.0));
        window.push(Some(2.0));
        assert!(!window.is_full());
        window.push(Some(3.0));
        window.push(Some(4.0));
        assert!(window.is_full());
        assert_eq!(window.len(), 3);
        assert_eq!(
            window.values.iter().copied().collect::<Vec<_>>(),
            vec![Some(2.0), Some(3.0), Some(4.0)]
        );
    }

    #[test]
    fn test_unevaluable_until_full() {
        let variation = Variation::new(1.1, 1.0, 3.0);
        let mut window = PersistenceWindow::new(3);
        window.push(Some(1.0));
        window.push(Some(1.0));
        assert_eq!(window.is_stuck(&variation), None);
        window.push(Some(1.0));
        assert_eq!(window.is_stuck(&variation), Some(true));
        window.push(Some(2.5));
        assert_eq!(window.is_stuck(&variation), Some(false));
    }

    #[test]
    fn test_gap_leaves_window_after_capacity_rows() {
        let variation = Variation::new(0.5, 0.0, 10.0);
        let mut window = PersistenceWindow::new(2);
        window.push(None);
        window.push(Some(5.0));
        assert_eq!(window.is_stuck(&variation), Some(false));
        window.push(Some(5.0));
        assert_eq!(window.is_stuck(&variation), Some(true));
        window.clear();
        assert!(window.is_empty());
    }
}
