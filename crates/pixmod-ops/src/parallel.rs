//! Row-parallel execution of per-pixel work.
//!
//! Every transformation writes a freshly allocated output buffer whose rows
//! are independent of each other. The output is split into batches of
//! [`ROWS_PER_BATCH`] rows and each batch is handed to a worker, using Rayon
//! when the `parallel` feature is enabled and a plain loop otherwise.
//!
//! Cancellation is coarse: a [`CancelToken`] is checked before each batch,
//! never per pixel. A cancelled call returns [`OpsError::Cancelled`] and the
//! caller drops the partially written output.
//!
//! # Example
//!
//! ```rust
//! use pixmod_ops::parallel::{for_each_row, CancelToken, try_for_each_row};
//!
//! let mut rows = vec![0u8; 4 * 100];
//! for_each_row(&mut rows, 4, |y, row| row.fill(y as u8));
//! assert_eq!(rows[4 * 99], 99);
//!
//! let token = CancelToken::new();
//! token.cancel();
//! assert!(try_for_each_row(&mut rows, 4, &token, |_, _| {}).is_err());
//! ```

use crate::{OpsError, OpsResult};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Number of output rows computed by one worker task.
pub const ROWS_PER_BATCH: usize = 16;

/// Shared cancellation flag checked between row batches.
///
/// Clones share the same flag, so a token handed to a pipeline can be
/// cancelled from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Returns [`OpsError::Cancelled`] if cancellation was requested.
    #[inline]
    pub fn check(&self) -> OpsResult<()> {
        if self.is_cancelled() {
            Err(OpsError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Calls `f(y, row)` for every `row_len`-sized row of `dst`.
///
/// Rows are distributed across workers in batches; `f` must only write to
/// the row it is given.
pub fn for_each_row<T, F>(dst: &mut [T], row_len: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Send + Sync,
{
    if row_len == 0 {
        return;
    }
    let batch_len = row_len * ROWS_PER_BATCH;

    #[cfg(feature = "parallel")]
    {
        dst.par_chunks_mut(batch_len)
            .enumerate()
            .for_each(|(b, chunk)| run_batch(b, chunk, row_len, &f));
    }

    #[cfg(not(feature = "parallel"))]
    {
        dst.chunks_mut(batch_len)
            .enumerate()
            .for_each(|(b, chunk)| run_batch(b, chunk, row_len, &f));
    }
}

/// Like [`for_each_row`], but checks `cancel` before each batch.
///
/// # Errors
///
/// Returns [`OpsError::Cancelled`] if the token was cancelled before or
/// during the run. Rows of `dst` may then be partially written.
pub fn try_for_each_row<T, F>(
    dst: &mut [T],
    row_len: usize,
    cancel: &CancelToken,
    f: F,
) -> OpsResult<()>
where
    T: Send,
    F: Fn(usize, &mut [T]) + Send + Sync,
{
    cancel.check()?;
    if row_len == 0 {
        return Ok(());
    }
    let batch_len = row_len * ROWS_PER_BATCH;

    #[cfg(feature = "parallel")]
    let result = dst
        .par_chunks_mut(batch_len)
        .enumerate()
        .try_for_each(|(b, chunk)| -> OpsResult<()> {
            cancel.check()?;
            run_batch(b, chunk, row_len, &f);
            Ok(())
        });

    #[cfg(not(feature = "parallel"))]
    let result = dst
        .chunks_mut(batch_len)
        .enumerate()
        .try_for_each(|(b, chunk)| -> OpsResult<()> {
            cancel.check()?;
            run_batch(b, chunk, row_len, &f);
            Ok(())
        });

    result
}

#[inline]
fn run_batch<T, F>(batch: usize, chunk: &mut [T], row_len: usize, f: &F)
where
    F: Fn(usize, &mut [T]),
{
    let first = batch * ROWS_PER_BATCH;
    for (i, row) in chunk.chunks_mut(row_len).enumerate() {
        f(first + i, row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_get_their_index() {
        let rows = ROWS_PER_BATCH * 3 + 5;
        let mut data = vec![0u32; rows * 2];
        for_each_row(&mut data, 2, |y, row| {
            row[0] = y as u32;
            row[1] = y as u32 * 10;
        });
        for y in 0..rows {
            assert_eq!(data[y * 2], y as u32);
            assert_eq!(data[y * 2 + 1], y as u32 * 10);
        }
    }

    #[test]
    fn test_try_completes_when_not_cancelled() {
        let mut data = vec![0u8; 64 * 3];
        let token = CancelToken::new();
        try_for_each_row(&mut data, 3, &token, |_, row| row.fill(7)).unwrap();
        assert!(data.iter().all(|&v| v == 7));
    }

    #[test]
    fn test_cancelled_before_start() {
        let mut data = vec![0u8; 64];
        let token = CancelToken::new();
        token.cancel();
        let err = try_for_each_row(&mut data, 4, &token, |_, row| row.fill(1)).unwrap_err();
        assert_eq!(err, OpsError::Cancelled);
        assert!(data.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_cancel_mid_run() {
        // The first row to run cancels; batches started afterwards bail out.
        let rows = ROWS_PER_BATCH * 4096;
        let mut data = vec![0u8; rows];
        let token = CancelToken::new();
        let inner = token.clone();
        let result = try_for_each_row(&mut data, 1, &token, move |_, row| {
            inner.cancel();
            row[0] = 1;
        });
        assert_eq!(result, Err(OpsError::Cancelled));
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_token_clones_share_state() {
        let a = CancelToken::new();
        let b = a.clone();
        assert!(a.check().is_ok());
        b.cancel();
        assert!(a.is_cancelled());
    }
}
