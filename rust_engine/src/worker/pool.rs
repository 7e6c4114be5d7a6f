//! 姿态计算后台线程
//!
//! 单线程轮流调用所有已注册计算器的 `step`。全部计算器都没有工作时，在条件变量上
//! 限时等待，直到 register / notify / shutdown 唤醒或超时。
//!
//! 状态：Idle（无线程）-> Running -> Stopping -> Idle。shutdown 之后不可再注册。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use crate::config::WorkerConfig;
use crate::{MmdError, Result};

use super::calculator::PoseCalculator;
use super::lock;

/// 工作线程状态
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerState {
    /// 没有线程
    Idle,
    /// 线程运行中（可能正在等待）
    Running,
    /// 已请求停止，等待线程退出
    Stopping,
}

struct Registry {
    calculators: Vec<Arc<dyn PoseCalculator>>,
    state: WorkerState,
    wake_pending: bool,
    terminated: bool,
    exited: bool,
}

impl Registry {
    fn contains(&self, calculator: &Arc<dyn PoseCalculator>) -> bool {
        self.calculators.iter().any(|c| same_calculator(c, calculator))
    }
}

struct Shared {
    registry: Mutex<Registry>,
    wake: Condvar,
    exit: Condvar,
    cancel: AtomicBool,
}

impl Shared {
    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }
}

/// 线程退出时（包括 panic）标记 exited 并通知 shutdown
struct ExitGuard(Arc<Shared>);

impl Drop for ExitGuard {
    fn drop(&mut self) {
        let mut registry = lock(&self.0.registry);
        registry.exited = true;
        registry.state = WorkerState::Idle;
        drop(registry);
        self.0.exit.notify_all();
    }
}

/// 姿态计算后台线程
pub struct CalculatorWorker {
    shared: Arc<Shared>,
    handle: Mutex<Option<JoinHandle<()>>>,
    config: WorkerConfig,
}

impl CalculatorWorker {
    pub fn new(config: WorkerConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                registry: Mutex::new(Registry {
                    calculators: Vec::new(),
                    state: WorkerState::Idle,
                    wake_pending: false,
                    terminated: false,
                    exited: true,
                }),
                wake: Condvar::new(),
                exit: Condvar::new(),
                cancel: AtomicBool::new(false),
            }),
            handle: Mutex::new(None),
            config,
        }
    }

    /// 注册计算器；必要时启动线程，并唤醒线程
    pub fn register(&self, calculator: Arc<dyn PoseCalculator>) -> Result<()> {
        let mut registry = lock(&self.shared.registry);
        if registry.terminated {
            return Err(MmdError::WorkerTerminated);
        }

        if registry.state == WorkerState::Idle {
            let shared = Arc::clone(&self.shared);
            let idle_wait = self.config.idle_wait;
            let handle = thread::Builder::new()
                .name(self.config.thread_name.clone())
                .spawn(move || run(shared, idle_wait))?;
            *lock(&self.handle) = Some(handle);
            registry.state = WorkerState::Running;
            registry.exited = false;
            log::debug!("姿态计算线程已启动");
        }

        if !registry.contains(&calculator) {
            registry.calculators.push(calculator);
        }
        registry.wake_pending = true;
        drop(registry);

        self.shared.wake.notify_all();
        Ok(())
    }

    /// 注销计算器；线程不会退出，只是进入等待
    pub fn unregister(&self, calculator: &Arc<dyn PoseCalculator>) {
        lock(&self.shared.registry)
            .calculators
            .retain(|c| !same_calculator(c, calculator));
    }

    /// 计算器有了新输入，唤醒线程；未注册的计算器忽略
    pub fn notify(&self, calculator: &Arc<dyn PoseCalculator>) {
        let mut registry = lock(&self.shared.registry);
        if !registry.contains(calculator) {
            log::trace!("忽略未注册计算器的唤醒请求");
            return;
        }
        registry.wake_pending = true;
        drop(registry);
        self.shared.wake.notify_all();
    }

    pub fn state(&self) -> WorkerState {
        lock(&self.shared.registry).state
    }

    pub fn registered_count(&self) -> usize {
        lock(&self.shared.registry).calculators.len()
    }

    /// 是否仍持有线程句柄
    pub fn has_thread(&self) -> bool {
        lock(&self.handle).is_some()
    }

    /// 停止并等待线程退出
    ///
    /// 会阻塞最多 `join_timeout`，只应在销毁流程中调用。超时后放弃线程句柄并返回
    /// [`MmdError::WorkerJoinTimeout`]。重复调用无副作用。
    pub fn shutdown(&self) -> Result<()> {
        {
            let mut registry = lock(&self.shared.registry);
            registry.terminated = true;
            registry.calculators.clear();
            if registry.state == WorkerState::Running {
                registry.state = WorkerState::Stopping;
            }
            self.shared.cancel.store(true, Ordering::Release);
            registry.wake_pending = true;
        }
        self.shared.wake.notify_all();

        let Some(handle) = lock(&self.handle).take() else {
            return Ok(());
        };

        let timeout = self.config.join_timeout;
        let registry = lock(&self.shared.registry);
        let (registry, _) = self
            .shared
            .exit
            .wait_timeout_while(registry, timeout, |r| !r.exited)
            .unwrap_or_else(|e| e.into_inner());
        let exited = registry.exited;
        drop(registry);

        if !exited {
            log::error!("姿态计算线程未能在 {:?} 内退出，放弃等待", timeout);
            return Err(MmdError::WorkerJoinTimeout { timeout });
        }

        if handle.join().is_err() {
            log::error!("姿态计算线程异常退出");
        }
        log::debug!("姿态计算线程已停止");
        Ok(())
    }
}

impl Default for CalculatorWorker {
    fn default() -> Self {
        Self::new(WorkerConfig::default())
    }
}

impl Drop for CalculatorWorker {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::error!("Failed to stop pose worker: {}", e);
        }
    }
}

fn same_calculator(a: &Arc<dyn PoseCalculator>, b: &Arc<dyn PoseCalculator>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

fn run(shared: Arc<Shared>, idle_wait: std::time::Duration) {
    let _guard = ExitGuard(Arc::clone(&shared));

    while !shared.is_cancelled() {
        let calculators = {
            let mut registry = lock(&shared.registry);
            registry.wake_pending = false;
            registry.calculators.clone()
        };

        let mut has_work = false;
        for calculator in &calculators {
            if shared.is_cancelled() {
                break;
            }
            // 本轮开始后被注销的计算器不再调用
            if !lock(&shared.registry).contains(calculator) {
                continue;
            }
            if calculator.step() {
                has_work = true;
            }
        }
        if has_work {
            continue;
        }

        let registry = lock(&shared.registry);
        log::trace!("姿态计算线程进入等待");
        let _ = shared
            .wake
            .wait_timeout_while(registry, idle_wait, |r| !r.wake_pending && !shared.is_cancelled())
            .unwrap_or_else(|e| e.into_inner());
    }

    log::debug!("姿态计算线程退出");
}
