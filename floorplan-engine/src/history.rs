/// 线性撤销/重做栈，元素是完整的状态快照。
///
/// 调用方负责在每次修改前 `record` 当前状态；撤销/重做通过值交换完成，
/// 快照入栈后不会再被原地修改。
#[derive(Debug, Clone)]
pub struct History<T> {
    past: Vec<T>,
    future: Vec<T>,
    limit: usize,
}

impl<T> History<T> {
    /// `limit` 为撤销栈上限，0 表示不限制。
    pub fn new(limit: usize) -> Self {
        Self {
            past: Vec::new(),
            future: Vec::new(),
            limit,
        }
    }

    /// 压入修改前的状态并清空重做栈。
    pub fn record(&mut self, snapshot: T) {
        self.past.push(snapshot);
        self.future.clear();
        if self.limit > 0 && self.past.len() > self.limit {
            let overflow = self.past.len() - self.limit;
            self.past.drain(..overflow);
        }
    }

    /// 丢弃最近一次记录（例如绘制被取消、状态实际未变化）。
    pub fn discard_last(&mut self) -> Option<T> {
        self.past.pop()
    }

    /// 以 `current` 交换撤销栈顶。栈为空时原样返回 `Err(current)`。
    pub fn undo(&mut self, current: T) -> Result<T, T> {
        match self.past.pop() {
            Some(previous) => {
                self.future.push(current);
                Ok(previous)
            }
            None => Err(current),
        }
    }

    /// `undo` 的镜像操作。
    pub fn redo(&mut self, current: T) -> Result<T, T> {
        match self.future.pop() {
            Some(next) => {
                self.past.push(current);
                Ok(next)
            }
            None => Err(current),
        }
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    #[inline]
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    #[inline]
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    #[inline]
    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    #[inline]
    pub fn future_len(&self) -> usize {
        self.future.len()
    }
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undo_and_redo_swap_states() {
        let mut history = History::new(0);
        history.record(1);
        history.record(2);

        assert_eq!(history.undo(3), Ok(2));
        assert_eq!(history.undo(2), Ok(1));
        assert_eq!(history.undo(1), Err(1));

        assert_eq!(history.redo(1), Ok(2));
        assert_eq!(history.redo(2), Ok(3));
        assert_eq!(history.redo(3), Err(3));
    }

    #[test]
    fn record_clears_future() {
        let mut history = History::new(0);
        history.record("a");
        assert_eq!(history.undo("b"), Ok("a"));
        assert!(history.can_redo());
        history.record("a");
        assert!(!history.can_redo());
        assert_eq!(history.past_len(), 1);
    }

    #[test]
    fn limit_keeps_most_recent_entries() {
        let mut history = History::new(3);
        for value in 0..10 {
            history.record(value);
        }
        assert_eq!(history.past_len(), 3);
        assert_eq!(history.undo(10), Ok(9));
        assert_eq!(history.undo(9), Ok(8));
        assert_eq!(history.undo(8), Ok(7));
        assert!(!history.can_undo());
    }

    #[test]
    fn discard_last_drops_only_latest() {
        let mut history = History::new(0);
        history.record(1);
        history.record(2);
        assert_eq!(history.discard_last(), Some(2));
        assert_eq!(history.past_len(), 1);
    }
}
