//! transport
//!
//! Smart-transport registration and the managed fallbacks.
//!
//! The native library resolves remote URLs against a prefix registry. This
//! module is the seam through which Rust transports enter that registry:
//! [`register`] installs a factory under a URL prefix, the native side calls
//! back through panic-isolated C shims, and the factory's state crosses the
//! FFI boundary as a handle-registry token rather than a raw pointer, so a
//! stale native context can never reach freed Rust state.
//!
//! Two managed fallbacks live here as well. They are registered by
//! [`crate::runtime::init`] only when the corresponding native capability
//! was not compiled in: smart HTTP over a blocking reqwest client, and ssh
//! by spawning the system `ssh` client and streaming its stdio (the same
//! approach git itself takes for ssh remotes).
//!
//! # Failure reporting
//!
//! A callback failure is written into the native thread-local error slot
//! and returned as the structured error's raw code; failures with no
//! representable code become `GIT_EUSER`, marking the failure as
//! managed-side in origin.

use std::collections::BTreeMap;
use std::ffi::CStr;
use std::io::{self, Read, Write};
use std::panic::{self, AssertUnwindSafe};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::{Arc, Mutex};

use libc::{c_char, c_int, c_uint, c_void, size_t};
use tracing::{debug, trace};

use crate::error::{Error, ErrorClass, ErrorCode};
use crate::raw;
use crate::runtime;
use crate::util::into_c_string;

/// The smart-protocol service a connection is opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// Fetch, listing phase.
    UploadPackLs,
    /// Fetch, packfile phase.
    UploadPack,
    /// Push, listing phase.
    ReceivePackLs,
    /// Push, packfile phase.
    ReceivePack,
}

impl Service {
    fn from_raw(raw_service: c_int) -> Option<Self> {
        match raw_service {
            raw::GIT_SERVICE_UPLOADPACK_LS => Some(Service::UploadPackLs),
            raw::GIT_SERVICE_UPLOADPACK => Some(Service::UploadPack),
            raw::GIT_SERVICE_RECEIVEPACK_LS => Some(Service::ReceivePackLs),
            raw::GIT_SERVICE_RECEIVEPACK => Some(Service::ReceivePack),
            _ => None,
        }
    }

    /// The remote command implementing this service.
    fn command(&self) -> &'static str {
        match self {
            Service::UploadPackLs | Service::UploadPack => "git-upload-pack",
            Service::ReceivePackLs | Service::ReceivePack => "git-receive-pack",
        }
    }

    fn is_listing(&self) -> bool {
        matches!(self, Service::UploadPackLs | Service::ReceivePackLs)
    }
}

/// A bidirectional byte stream carrying one smart-protocol exchange.
pub trait SmartSubtransportStream: Read + Write + Send + 'static {}

impl<T: Read + Write + Send + 'static> SmartSubtransportStream for T {}

/// One connection's worth of smart-protocol actions.
///
/// Implementations are driven by the native library: `action` is invoked
/// for each protocol phase and returns the stream that phase talks over;
/// `close` ends the connection. Failures returned here are round-tripped
/// through the native library with their class and code intact.
pub trait SmartSubtransport: Send + 'static {
    fn action(
        &mut self,
        url: &str,
        service: Service,
    ) -> Result<Box<dyn SmartSubtransportStream>, Error>;

    fn close(&mut self) -> Result<(), Error>;
}

type Factory = dyn Fn() -> Result<Box<dyn SmartSubtransport>, Error> + Send + Sync;

struct TransportData {
    factory: Box<Factory>,
    /// Stateless rpc transports get a fresh connection per action.
    rpc: bool,
}

/// Prefix → handle-registry token for everything registered through here.
///
/// The native registry does not tear custom registrations down at library
/// shutdown, so [`unregister_all`] walks this map to remove them before the
/// library goes away.
static REGISTERED: Mutex<BTreeMap<String, usize>> = Mutex::new(BTreeMap::new());

/// Register a smart transport factory for a URL prefix.
///
/// `rpc` marks the transport as stateless (one request per action, as in
/// smart HTTP). The factory is invoked once per connection the native
/// library opens. Registration fails if the prefix is already taken.
///
/// Requires an initialized library.
pub fn register<F>(prefix: &str, rpc: bool, factory: F) -> Result<(), Error>
where
    F: Fn() -> Result<Box<dyn SmartSubtransport>, Error> + Send + Sync + 'static,
{
    let c_prefix = into_c_string(prefix)?;
    let data = Arc::new(TransportData {
        factory: Box::new(factory),
        rpc,
    });
    let token = runtime::handles().track(data);

    let ret = unsafe {
        raw::git_transport_register(c_prefix.as_ptr(), Some(transport_factory), token as *mut c_void)
    };
    if ret < 0 {
        let err = Error::last_error(ret);
        runtime::handles().untrack(token);
        return Err(err);
    }

    REGISTERED
        .lock()
        .expect("transport registry poisoned")
        .insert(prefix.to_string(), token);
    debug!(prefix, rpc, "registered smart transport");
    Ok(())
}

/// Remove a previously registered transport prefix.
pub fn unregister(prefix: &str) -> Result<(), Error> {
    let c_prefix = into_c_string(prefix)?;
    let ret = unsafe { raw::git_transport_unregister(c_prefix.as_ptr()) };
    if ret < 0 {
        return Err(Error::last_error(ret));
    }
    if let Some(token) = REGISTERED
        .lock()
        .expect("transport registry poisoned")
        .remove(prefix)
    {
        runtime::handles().untrack(token);
    }
    debug!(prefix, "unregistered smart transport");
    Ok(())
}

/// Register the managed smart-HTTP fallback for `http://` and `https://`.
///
/// Called by [`crate::runtime::init`] when the native library was built
/// without HTTPS support.
pub(crate) fn register_managed_https() -> Result<(), Error> {
    for prefix in ["http://", "https://"] {
        register(prefix, true, || {
            let client = reqwest::blocking::Client::builder()
                .user_agent(concat!("git/2.0 (gitcore ", env!("CARGO_PKG_VERSION"), ")"))
                .build()
                .map_err(|e| Error::new(ErrorClass::Net, ErrorCode::Generic, e.to_string()))?;
            Ok(Box::new(HttpSubtransport { client }) as Box<dyn SmartSubtransport>)
        })?;
    }
    Ok(())
}

/// Register the managed ssh fallback, which drives the system `ssh` client.
///
/// Called by [`crate::runtime::init`] when the native library was built
/// without SSH support.
pub(crate) fn register_managed_ssh() -> Result<(), Error> {
    for prefix in ["ssh://", "ssh+git://", "git+ssh://"] {
        register(prefix, false, || {
            Ok(Box::new(SshSubtransport { conn: None }) as Box<dyn SmartSubtransport>)
        })?;
    }
    Ok(())
}

/// Unregister every transport registered through this module, managed
/// fallbacks and custom registrations alike.
///
/// The native registry does not do this at shutdown, and a registration
/// left dangling there points at state the next lifecycle has invalidated.
/// The caller treats any failure here as fatal for exactly that reason.
pub(crate) fn unregister_all() -> Result<(), Error> {
    let prefixes: Vec<String> = REGISTERED
        .lock()
        .expect("transport registry poisoned")
        .keys()
        .cloned()
        .collect();
    for prefix in prefixes {
        unregister(&prefix)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// C shims
// ---------------------------------------------------------------------------

/// Report a structured error into the native thread-local slot and pick the
/// status to return from a callback.
fn report(err: &Error) -> c_int {
    if let Ok(msg) = into_c_string(err.message()) {
        unsafe { raw::git_error_set_str(err.class().raw(), msg.as_ptr()) };
    }
    match err.code() {
        ErrorCode::Ok => raw::GIT_EUSER,
        code => code.raw(),
    }
}

fn report_panic() -> c_int {
    report(&Error::new(
        ErrorClass::Callback,
        ErrorCode::User,
        "panic in transport callback",
    ))
}

fn stale_token_error() -> Error {
    Error::new(
        ErrorClass::Callback,
        ErrorCode::NotFound,
        "transport registration no longer tracked; library was shut down?",
    )
}

unsafe extern "C" fn transport_factory(
    out: *mut *mut raw::git_transport,
    owner: *mut raw::git_remote,
    param: *mut c_void,
) -> c_int {
    let rpc = match panic::catch_unwind(|| {
        runtime::handles()
            .lookup(param as usize)
            .and_then(|obj| obj.downcast::<TransportData>().ok())
            .map(|data| data.rpc)
    }) {
        Ok(Some(rpc)) => rpc,
        Ok(None) => return report(&stale_token_error()),
        Err(_) => return report_panic(),
    };

    let mut definition = raw::git_smart_subtransport_definition {
        callback: Some(subtransport_factory),
        rpc: rpc as c_uint,
        param,
    };
    // git_transport_smart copies the definition during construction.
    raw::git_transport_smart(out, owner, &mut definition as *mut _ as *mut c_void)
}

#[repr(C)]
struct RawSubtransport {
    vtable: raw::git_smart_subtransport,
    obj: Box<dyn SmartSubtransport>,
}

unsafe extern "C" fn subtransport_factory(
    out: *mut *mut raw::git_smart_subtransport,
    _owner: *mut raw::git_transport,
    param: *mut c_void,
) -> c_int {
    let result = panic::catch_unwind(|| -> Result<Box<dyn SmartSubtransport>, Error> {
        let data = runtime::handles()
            .lookup(param as usize)
            .and_then(|obj| obj.downcast::<TransportData>().ok())
            .ok_or_else(stale_token_error)?;
        (data.factory)()
    });
    match result {
        Ok(Ok(obj)) => {
            trace!("smart subtransport connection opened");
            let boxed = Box::new(RawSubtransport {
                vtable: raw::git_smart_subtransport {
                    action: Some(subtransport_action),
                    close: Some(subtransport_close),
                    free: Some(subtransport_free),
                },
                obj,
            });
            *out = Box::into_raw(boxed) as *mut raw::git_smart_subtransport;
            raw::GIT_OK
        }
        Ok(Err(err)) => report(&err),
        Err(_) => report_panic(),
    }
}

unsafe extern "C" fn subtransport_action(
    out: *mut *mut raw::git_smart_subtransport_stream,
    transport: *mut raw::git_smart_subtransport,
    url: *const c_char,
    action: c_int,
) -> c_int {
    let subtransport = &mut *(transport as *mut RawSubtransport);
    let result = panic::catch_unwind(AssertUnwindSafe(
        || -> Result<Box<dyn SmartSubtransportStream>, Error> {
            let service = Service::from_raw(action).ok_or_else(|| {
                Error::new(ErrorClass::Net, ErrorCode::Invalid, "unknown smart service")
            })?;
            let url = CStr::from_ptr(url).to_str().map_err(|_| {
                Error::new(ErrorClass::Net, ErrorCode::Invalid, "remote url is not utf-8")
            })?;
            subtransport.obj.action(url, service)
        },
    ));
    match result {
        Ok(Ok(stream)) => {
            let boxed = Box::new(RawStream {
                vtable: raw::git_smart_subtransport_stream {
                    subtransport: transport,
                    read: Some(stream_read),
                    write: Some(stream_write),
                    free: Some(stream_free),
                },
                obj: stream,
            });
            *out = Box::into_raw(boxed) as *mut raw::git_smart_subtransport_stream;
            raw::GIT_OK
        }
        Ok(Err(err)) => report(&err),
        Err(_) => report_panic(),
    }
}

unsafe extern "C" fn subtransport_close(transport: *mut raw::git_smart_subtransport) -> c_int {
    let subtransport = &mut *(transport as *mut RawSubtransport);
    match panic::catch_unwind(AssertUnwindSafe(|| subtransport.obj.close())) {
        Ok(Ok(())) => raw::GIT_OK,
        Ok(Err(err)) => report(&err),
        Err(_) => report_panic(),
    }
}

unsafe extern "C" fn subtransport_free(transport: *mut raw::git_smart_subtransport) {
    drop(Box::from_raw(transport as *mut RawSubtransport));
}

#[repr(C)]
struct RawStream {
    vtable: raw::git_smart_subtransport_stream,
    obj: Box<dyn SmartSubtransportStream>,
}

fn io_error(err: &io::Error) -> Error {
    Error::new(ErrorClass::Net, ErrorCode::Generic, err.to_string())
}

unsafe extern "C" fn stream_read(
    stream: *mut raw::git_smart_subtransport_stream,
    buffer: *mut c_char,
    buf_size: size_t,
    bytes_read: *mut size_t,
) -> c_int {
    let stream = &mut *(stream as *mut RawStream);
    let buf = std::slice::from_raw_parts_mut(buffer as *mut u8, buf_size);
    match panic::catch_unwind(AssertUnwindSafe(|| stream.obj.read(buf))) {
        Ok(Ok(n)) => {
            *bytes_read = n;
            raw::GIT_OK
        }
        Ok(Err(err)) => report(&io_error(&err)),
        Err(_) => report_panic(),
    }
}

unsafe extern "C" fn stream_write(
    stream: *mut raw::git_smart_subtransport_stream,
    buffer: *const c_char,
    len: size_t,
) -> c_int {
    let stream = &mut *(stream as *mut RawStream);
    let buf = std::slice::from_raw_parts(buffer as *const u8, len);
    match panic::catch_unwind(AssertUnwindSafe(|| stream.obj.write_all(buf))) {
        Ok(Ok(())) => raw::GIT_OK,
        Ok(Err(err)) => report(&io_error(&err)),
        Err(_) => report_panic(),
    }
}

unsafe extern "C" fn stream_free(stream: *mut raw::git_smart_subtransport_stream) {
    drop(Box::from_raw(stream as *mut RawStream));
}

// ---------------------------------------------------------------------------
// Managed smart-HTTP fallback
// ---------------------------------------------------------------------------

struct HttpSubtransport {
    client: reqwest::blocking::Client,
}

impl SmartSubtransport for HttpSubtransport {
    fn action(
        &mut self,
        url: &str,
        service: Service,
    ) -> Result<Box<dyn SmartSubtransportStream>, Error> {
        Ok(Box::new(HttpStream {
            client: self.client.clone(),
            url: url.to_string(),
            service,
            body: Vec::new(),
            response: None,
        }))
    }

    fn close(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

/// One smart-HTTP exchange: writes buffer the request body, the first read
/// sends the request and streams the response.
struct HttpStream {
    client: reqwest::blocking::Client,
    url: String,
    service: Service,
    body: Vec<u8>,
    response: Option<reqwest::blocking::Response>,
}

impl HttpStream {
    fn send_request(&mut self) -> io::Result<()> {
        let command = self.service.command();
        let request = if self.service.is_listing() {
            self.client
                .get(format!("{}/info/refs?service={command}", self.url))
        } else {
            self.client
                .post(format!("{}/{command}", self.url))
                .header("Content-Type", format!("application/x-{command}-request"))
                .header("Accept", format!("application/x-{command}-result"))
                .body(std::mem::take(&mut self.body))
        };
        let response = request
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        self.response = Some(response);
        Ok(())
    }
}

impl Read for HttpStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.response.is_none() {
            self.send_request()?;
        }
        match self.response.as_mut() {
            Some(response) => response.read(buf),
            None => Err(io::Error::new(io::ErrorKind::Other, "request not sent")),
        }
    }
}

impl Write for HttpStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.response.is_some() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "request already sent on this rpc stream",
            ));
        }
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Managed ssh fallback
// ---------------------------------------------------------------------------

struct SshSubtransport {
    conn: Option<SshConnection>,
}

struct SshConnection {
    child: Child,
    stdin: Arc<Mutex<ChildStdin>>,
    stdout: Arc<Mutex<ChildStdout>>,
}

impl SmartSubtransport for SshSubtransport {
    fn action(
        &mut self,
        url: &str,
        service: Service,
    ) -> Result<Box<dyn SmartSubtransportStream>, Error> {
        if service.is_listing() {
            // Listing opens the connection; the packfile phase reuses it.
            self.conn = Some(SshConnection::spawn(url, service)?);
        }
        let conn = self.conn.as_ref().ok_or_else(|| {
            Error::new(
                ErrorClass::Net,
                ErrorCode::Invalid,
                "smart protocol phase out of order: no open ssh connection",
            )
        })?;
        Ok(Box::new(SshStream {
            stdin: Arc::clone(&conn.stdin),
            stdout: Arc::clone(&conn.stdout),
        }))
    }

    fn close(&mut self) -> Result<(), Error> {
        if let Some(mut conn) = self.conn.take() {
            let _ = conn.child.kill();
            conn.child.wait().map_err(|e| {
                Error::new(ErrorClass::Ssh, ErrorCode::Generic, e.to_string())
            })?;
        }
        Ok(())
    }
}

impl SshConnection {
    fn spawn(url: &str, service: Service) -> Result<Self, Error> {
        let endpoint = SshEndpoint::parse(url)?;
        let mut command = Command::new("ssh");
        if let Some(port) = endpoint.port {
            command.arg("-p").arg(port.to_string());
        }
        let mut child = command
            .arg(&endpoint.host)
            .arg(format!("{} '{}'", service.command(), endpoint.path))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                Error::new(
                    ErrorClass::Ssh,
                    ErrorCode::Generic,
                    format!("failed to spawn ssh: {e}"),
                )
            })?;
        let missing_pipe =
            || Error::new(ErrorClass::Ssh, ErrorCode::Generic, "ssh child is missing a pipe");
        let stdin = child.stdin.take().ok_or_else(missing_pipe)?;
        let stdout = child.stdout.take().ok_or_else(missing_pipe)?;
        Ok(Self {
            child,
            stdin: Arc::new(Mutex::new(stdin)),
            stdout: Arc::new(Mutex::new(stdout)),
        })
    }
}

struct SshStream {
    stdin: Arc<Mutex<ChildStdin>>,
    stdout: Arc<Mutex<ChildStdout>>,
}

impl Read for SshStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stdout.lock().expect("ssh stdout poisoned").read(buf)
    }
}

impl Write for SshStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stdin.lock().expect("ssh stdin poisoned").write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdin.lock().expect("ssh stdin poisoned").flush()
    }
}

/// The pieces of an ssh remote URL the `ssh` client needs.
#[derive(Debug, PartialEq, Eq)]
struct SshEndpoint {
    /// `user@host` or bare host.
    host: String,
    port: Option<u16>,
    path: String,
}

impl SshEndpoint {
    /// Accepts `ssh://[user@]host[:port]/path` and the scp-like
    /// `[user@]host:path` form.
    fn parse(input: &str) -> Result<Self, Error> {
        let invalid = |msg: &str| Error::new(ErrorClass::Ssh, ErrorCode::Invalid, msg.to_string());

        let endpoint = if input.contains("://") {
            let parsed = url::Url::parse(input)
                .map_err(|e| invalid(&format!("invalid ssh url: {e}")))?;
            let host = parsed.host_str().ok_or_else(|| invalid("ssh url has no host"))?;
            let host = if parsed.username().is_empty() {
                host.to_string()
            } else {
                format!("{}@{host}", parsed.username())
            };
            Self {
                host,
                port: parsed.port(),
                path: parsed.path().to_string(),
            }
        } else {
            let (host, path) = input
                .split_once(':')
                .ok_or_else(|| invalid("scp-like url needs host:path"))?;
            if host.is_empty() || path.is_empty() {
                return Err(invalid("scp-like url needs host:path"));
            }
            Self {
                host: host.to_string(),
                port: None,
                path: path.to_string(),
            }
        };

        // The path is interpolated into a remote shell command line.
        if endpoint.path.contains('\'') {
            return Err(invalid("refusing ssh path containing a quote"));
        }
        Ok(endpoint)
    }
}
