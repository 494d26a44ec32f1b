use std::future::Future;
use std::panic::Location;

use unit_dump::Frame;

use crate::registry::ParkToken;
use crate::tracker::Current;

/// Releases this park's reason and frame when the parked future finishes or
/// is dropped mid-wait.
struct Unpark {
    current: Current,
    token: Option<ParkToken>,
}

impl Drop for Unpark {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            self.current.registry.unpark(self.current.id, token);
        }
    }
}

pub(crate) async fn park_at<F: Future>(
    func: &'static str,
    reason: String,
    site: &'static Location<'static>,
    future: F,
) -> F::Output {
    let Some(current) = Current::get() else {
        return future.await;
    };
    let frame = Frame::new(func, site.file(), site.line());
    let token = current.registry.park(current.id, reason, frame);
    let _unpark = Unpark { current, token };
    future.await
}

/// Await `future` while reporting the current unit as blocked for `reason`.
///
/// The reason is the free-form text that ends up in dumps, e.g. `"IO wait"`.
/// Outside a tracked unit this is a plain `.await`.
///
/// ```no_run
/// # async fn demo(socket: tokio::net::TcpStream) -> std::io::Result<()> {
/// unit_trace::park("IO wait", socket.readable()).await?;
/// # Ok(())
/// # }
/// ```
#[track_caller]
pub fn park<F: Future>(reason: impl Into<String>, future: F) -> impl Future<Output = F::Output> {
    park_at("unit_trace::park", reason.into(), Location::caller(), future)
}

/// Never completes, reported as an empty `select`.
#[track_caller]
pub fn select_pending<T>() -> impl Future<Output = T> {
    park_at(
        "unit_trace::select_pending",
        "select (no cases)".to_string(),
        Location::caller(),
        std::future::pending(),
    )
}
