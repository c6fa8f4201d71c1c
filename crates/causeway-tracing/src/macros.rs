/// Opens a span that lasts until the end of the enclosing scope.
///
/// The literal name is hashed at compile time and kept, together with the
/// call site's source location, in a `static`. The span parents under the
/// thread's ambient context; pass [`crate::attrs::caused_by`] and
/// [`crate::attrs::attr`] values for causal links and attributes.
///
/// # Examples
///
/// ```
/// use causeway_tracing::prelude::*;
///
/// # fn main() {
/// span_scope!("update");
/// span_scope!(RENDER_SCOPE, "render", attr("frame", 42));
/// # }
/// ```
#[macro_export]
macro_rules! span_scope {
    ($scope_name:ident, $name:expr $(, $arg:expr)* $(,)?) => {
        static $scope_name: $crate::strings::StaticStringSource =
            $crate::strings::StaticStringSource {
                hash: $crate::strings::fnv1a($name.as_bytes()),
                text: $name,
                module_path: module_path!(),
                file: file!(),
                line: line!(),
            };
        let _causeway_scope_guard = $crate::dispatch::start_span(
            &$scope_name,
            $crate::context::current(),
            &[$($arg),*],
        );
    };
    ($name:expr $(, $arg:expr)* $(,)?) => {
        $crate::span_scope!(_CAUSEWAY_SCOPE_METADATA, $name $(, $arg)*);
    };
}

/// Starts a span and returns its [`crate::spans::SpanGuard`] for explicit
/// control: early `end()`, moving into another scope, or handing its
/// `span_context()` to a worker thread.
///
/// # Examples
///
/// ```
/// use causeway_tracing::prelude::*;
///
/// # fn main() {
/// let mut span = start_span!("io", attr("path", "/tmp/data"));
/// // ...
/// span.end();
/// # }
/// ```
#[macro_export]
macro_rules! start_span {
    ($name:expr $(, $arg:expr)* $(,)?) => {{
        static _CAUSEWAY_SPAN_METADATA: $crate::strings::StaticStringSource =
            $crate::strings::StaticStringSource {
                hash: $crate::strings::fnv1a($name.as_bytes()),
                text: $name,
                module_path: module_path!(),
                file: file!(),
                line: line!(),
            };
        $crate::dispatch::start_span(
            &_CAUSEWAY_SPAN_METADATA,
            $crate::context::current(),
            &[$($arg),*],
        )
    }};
}

/// Records a point event under the ambient span and returns its identifier,
/// so later spans and events can cite it with
/// [`crate::attrs::caused_by`].
///
/// # Examples
///
/// ```
/// use causeway_tracing::prelude::*;
///
/// # fn main() {
/// let received = trace_event!("request_received", attr("bytes", 512));
/// trace_event!("request_parsed", caused_by(received));
/// # }
/// ```
#[macro_export]
macro_rules! trace_event {
    ($name:expr $(, $arg:expr)* $(,)?) => {{
        static _CAUSEWAY_EVENT_METADATA: $crate::strings::StaticStringSource =
            $crate::strings::StaticStringSource {
                hash: $crate::strings::fnv1a($name.as_bytes()),
                text: $name,
                module_path: module_path!(),
                file: file!(),
                line: line!(),
            };
        $crate::dispatch::record_event(
            &_CAUSEWAY_EVENT_METADATA,
            $crate::context::current(),
            &[$($arg),*],
        )
    }};
}
