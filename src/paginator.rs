//! Lazy page iteration, built on `futures::stream::unfold` and
//! `futures::stream::BoxStream` rather than a hand-rolled `Stream` impl.

use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, BoxStream};

use crate::error::SdkError;

/// An operation input that can carry a continuation token (`token_in`).
pub trait PaginatedInput {
    fn set_continuation_token(&mut self, token: Option<String>);
}

/// An operation output that can report the next page's continuation token
/// (`token_out`) and, implicitly, whether there is a next page at all.
pub trait PaginatedOutput {
    fn continuation_token(&self) -> Option<String>;

    /// Default: there's a next page iff the token is present and non-empty.
    /// Override when the service reports truncation via a separate
    /// `more_flag` instead of token emptiness.
    fn has_more(&self) -> bool {
        self.continuation_token()
            .map(|token| !token.is_empty())
            .unwrap_or(false)
    }
}

struct PageState<I> {
    input: I,
    done: bool,
}

/// Repeatedly invoke `command`, feeding each output's continuation token
/// back into the next input, until a page reports no more pages or an
/// error occurs. The returned stream is lazy: no call happens until the
/// stream is polled.
pub fn paginate<I, O, F, Fut>(input: I, command: F) -> BoxStream<'static, Result<O, SdkError>>
where
    I: PaginatedInput + Clone + Send + 'static,
    O: PaginatedOutput + Send + 'static,
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, SdkError>> + Send + 'static,
{
    let command = Arc::new(command);
    let state = PageState { input, done: false };

    Box::pin(stream::unfold(state, move |state| {
        let command = Arc::clone(&command);
        async move {
            if state.done {
                return None;
            }
            let PageState { input, .. } = state;
            let call_input = input.clone();

            match command(call_input).await {
                Ok(output) => {
                    let more = output.has_more();
                    let next_token = output.continuation_token();
                    let mut next_input = input;
                    if more {
                        next_input.set_continuation_token(next_token);
                        Some((Ok(output), PageState { input: next_input, done: false }))
                    } else {
                        Some((Ok(output), PageState { input: next_input, done: true }))
                    }
                }
                Err(error) => Some((Err(error), PageState { input, done: true })),
            }
        }
    }))
}
