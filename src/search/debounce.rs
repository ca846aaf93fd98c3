//! Leading + trailing debounce for async functions / 异步函数的防抖（首尾触发）
//!
//! Within a burst of calls (each call less than `wait` after the previous one)
//! the first call runs immediately and the last call runs once the burst has
//! been quiet for `wait`. Every call in between resolves with the trailing result.

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;

type Invoke<A, T> = Arc<dyn Fn(A) -> BoxFuture<'static, T> + Send + Sync>;

struct State<A, T> {
    /// End of the current burst, None when idle / 当前窗口截止时间
    deadline: Option<Instant>,
    /// Latest coalesced argument / 最近一次被合并的参数
    pending: Option<A>,
    waiters: Vec<oneshot::Sender<T>>,
    invocations: u64,
}

struct Inner<A, T> {
    wait: Duration,
    func: Invoke<A, T>,
    state: Mutex<State<A, T>>,
}

/// Debounced async function / 防抖后的异步函数
pub struct Debounced<A, T> {
    inner: Arc<Inner<A, T>>,
}

impl<A, T> Clone for Debounced<A, T> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<A, T> Debounced<A, T>
where
    A: Send + 'static,
    T: Clone + Send + 'static,
{
    pub fn new<F, Fut>(wait: Duration, func: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let func: Invoke<A, T> = Arc::new(move |arg| func(arg).boxed());
        Self {
            inner: Arc::new(Inner {
                wait,
                func,
                state: Mutex::new(State {
                    deadline: None,
                    pending: None,
                    waiters: Vec::new(),
                    invocations: 0,
                }),
            }),
        }
    }

    /// Number of underlying invocations so far / 实际调用次数
    pub fn invocations(&self) -> u64 {
        self.inner.state.lock().invocations
    }

    /// Call the debounced function / 调用防抖函数
    ///
    /// Returns None only if the trailing invocation was dropped before finishing.
    pub async fn call(&self, arg: A) -> Option<T> {
        let mut arg = Some(arg);
        let trailing = {
            let mut state = self.inner.state.lock();
            let idle = state.deadline.is_none();
            state.deadline = Some(Instant::now() + self.inner.wait);

            if idle {
                state.invocations += 1;
                None
            } else {
                state.pending = arg.take();
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                Some(rx)
            }
        };

        match (trailing, arg) {
            (Some(rx), _) => rx.await.ok(),
            // 首次调用立即执行
            (None, Some(arg)) => {
                tokio::spawn(trailing_edge(self.inner.clone()));
                Some((self.inner.func)(arg).await)
            }
            (None, None) => None,
        }
    }
}

/// Wait for the burst to go quiet, then run the last pending call / 等待窗口结束后执行最后一次调用
async fn trailing_edge<A, T>(inner: Arc<Inner<A, T>>)
where
    A: Send + 'static,
    T: Clone + Send + 'static,
{
    loop {
        let deadline = match inner.state.lock().deadline {
            Some(deadline) => deadline,
            None => return,
        };
        tokio::time::sleep_until(deadline).await;

        let (pending, waiters) = {
            let mut state = inner.state.lock();
            match state.deadline {
                // 窗口被后续调用延长
                Some(deadline) if deadline > Instant::now() => continue,
                _ => {}
            }
            state.deadline = None;
            let pending = state.pending.take();
            if pending.is_some() {
                state.invocations += 1;
            }
            (pending, std::mem::take(&mut state.waiters))
        };

        if let Some(arg) = pending {
            let output = (inner.func)(arg).await;
            for waiter in waiters {
                let _ = waiter.send(output.clone());
            }
        }
        return;
    }
}
