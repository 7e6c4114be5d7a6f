//! 后台姿态计算

mod calculator;
mod pool;

pub use calculator::{CameraPosePreCalculator, PoseCalculator};
pub use pool::{CalculatorWorker, WorkerState};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// 加锁；被 panic 污染的锁照常使用，锁内数据在每次写入后都保持一致
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
