use crate::{
    config::Config,
    error::{AppError, Result},
};
use std::future::Future;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::warn;

/// 以有界指数退避重试瞬态存储错误
///
/// 重试策略属于调用方; 存储层自己从不重试。
/// 约束冲突和参数校验错误不可重试, 第一次就原样返回。
pub async fn retry_transient<T, F, Fut>(config: &Config, operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let strategy = ExponentialBackoff::from_millis(config.retry_base_delay_ms)
        .map(jitter)
        .take(config.retry_max_attempts);

    RetryIf::spawn(strategy, operation, |err: &AppError| {
        let retryable = err.is_retryable();
        if retryable {
            warn!("Retrying after transient storage error: {}", err);
        }
        retryable
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn non_retryable_errors_fail_immediately() {
        let config = Config::default();
        let calls = AtomicUsize::new(0);

        let result: Result<()> = retry_transient(&config, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AppError::Validation("bad input".to_string())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_errors_are_retried_until_success() {
        let config = Config::default();
        let calls = AtomicUsize::new(0);

        let result = retry_transient(&config, || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(AppError::TransientStorage("connection reset".to_string()))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let config = Config::default();
        let calls = AtomicUsize::new(0);

        let result: Result<()> = retry_transient(&config, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AppError::TransientStorage("still down".to_string())) }
        })
        .await;

        assert!(result.is_err());
        // 首次调用 + 有界的重试次数
        assert_eq!(
            calls.load(Ordering::SeqCst),
            1 + config.retry_max_attempts
        );
    }
}
