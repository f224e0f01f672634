//! X11 window-system backend using x11rb + xcap
//!
//! Foreground control goes through EWMH: the active window is read from the
//! root window's `_NET_ACTIVE_WINDOW` property and changed by sending a
//! `_NET_ACTIVE_WINDOW` client message to the root, which the window manager
//! honours. Pixel capture goes through xcap, which has no lookup by id, so
//! windows are enumerated and matched on their X11 id.
//!
//! # Requirements
//!
//! - `DISPLAY` pointing at a running X server
//! - An EWMH-compliant window manager for foreground changes

use std::sync::Mutex;

use x11rb::{
    connection::Connection as _,
    protocol::xproto::{
        AtomEnum, ClientMessageEvent, ConnectionExt as _, EventMask, Window,
    },
    rust_connection::RustConnection,
};

use super::{ForegroundControl, WindowCapture};
use crate::{
    buffer::PixelBuffer,
    error::{CaptureError, CaptureResult},
    model::{BackendType, WindowHandle},
};

/// EWMH source indication for requests coming from a pager or tool
const SOURCE_INDICATION_PAGER: u32 = 2;

/// X11 backend with a lazily shared connection
#[derive(Debug)]
pub struct X11Backend {
    /// Shared connection and the default screen index
    conn: Mutex<Option<(RustConnection, usize)>>,
}

impl X11Backend {
    /// Connects to the display named by `DISPLAY`
    ///
    /// Fails with `BackendNotAvailable` when no X server is reachable.
    pub fn new() -> CaptureResult<Self> {
        let connection = Self::connect()?;
        Ok(Self {
            conn: Mutex::new(Some(connection)),
        })
    }

    fn connect() -> CaptureResult<(RustConnection, usize)> {
        x11rb::connect(None).map_err(|e| {
            tracing::error!("Failed to connect to X11: {}", e);
            CaptureError::BackendNotAvailable {
                backend: BackendType::X11,
            }
        })
    }

    /// Runs `f` against the shared connection, reconnecting once if it was
    /// dropped after an earlier failure
    fn with_connection<T>(
        &self,
        f: impl FnOnce(&RustConnection, Window) -> CaptureResult<T>,
    ) -> CaptureResult<T> {
        let mut guard = self.conn.lock().map_err(|_| CaptureError::Platform {
            operation: "x11_connection".to_string(),
            reason:    "connection mutex poisoned".to_string(),
        })?;

        if guard.is_none() {
            tracing::warn!("X11 connection lost, reconnecting");
            *guard = Some(Self::connect()?);
        }
        let Some((conn, screen_idx)) = guard.as_ref() else {
            return Err(CaptureError::BackendNotAvailable {
                backend: BackendType::X11,
            });
        };
        let root = conn.setup().roots[*screen_idx].root;

        let result = f(conn, root);
        if matches!(result, Err(CaptureError::Platform { .. })) {
            *guard = None;
        }
        result
    }

    fn x11_error(operation: &str, e: impl std::fmt::Display) -> CaptureError {
        CaptureError::Platform {
            operation: operation.to_string(),
            reason:    e.to_string(),
        }
    }

    fn active_window_atom(conn: &RustConnection) -> CaptureResult<u32> {
        Ok(conn
            .intern_atom(false, b"_NET_ACTIVE_WINDOW")
            .map_err(|e| Self::x11_error("intern_atom", e))?
            .reply()
            .map_err(|e| Self::x11_error("intern_atom", e))?
            .atom)
    }

    fn read_active_window(&self) -> CaptureResult<Option<WindowHandle>> {
        self.with_connection(|conn, root| {
            let atom = Self::active_window_atom(conn)?;
            let reply = conn
                .get_property(false, root, atom, AtomEnum::WINDOW, 0, 1)
                .map_err(|e| Self::x11_error("get_property", e))?
                .reply()
                .map_err(|e| Self::x11_error("get_property", e))?;
            let active = reply
                .value32()
                .and_then(|mut values| values.next())
                .filter(|&id| id != 0)
                .map(|id| WindowHandle(u64::from(id)));
            Ok(active)
        })
    }

    fn request_activation(&self, window: Window) -> CaptureResult<()> {
        self.with_connection(|conn, root| {
            let atom = Self::active_window_atom(conn)?;
            let event = ClientMessageEvent::new(
                32,
                window,
                atom,
                [SOURCE_INDICATION_PAGER, 0, 0, 0, 0],
            );
            conn.send_event(
                false,
                root,
                EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
                event,
            )
            .map_err(|e| Self::x11_error("send_event", e))?;
            conn.flush().map_err(|e| Self::x11_error("flush", e))?;
            Ok(())
        })
    }
}

fn window_id(handle: WindowHandle) -> CaptureResult<Window> {
    Window::try_from(handle.0).map_err(|_| CaptureError::InvalidHandle { handle })
}

impl WindowCapture for X11Backend {
    fn capture_window_pixels(&self, handle: WindowHandle) -> CaptureResult<PixelBuffer> {
        let win_id = window_id(handle)?;

        let windows = xcap::Window::all().map_err(|e| {
            tracing::error!("Failed to enumerate xcap windows: {}", e);
            CaptureError::BackendNotAvailable {
                backend: BackendType::X11,
            }
        })?;
        let window = windows
            .into_iter()
            .find(|w| w.id().ok() == Some(win_id))
            .ok_or(CaptureError::InvalidHandle { handle })?;

        if window.is_minimized().unwrap_or(false) {
            return Err(CaptureError::Minimized { handle });
        }

        tracing::debug!(
            "Capturing X11 window {} ('{}')",
            handle,
            window.title().unwrap_or_else(|_| "Unknown".to_string())
        );
        let image = window
            .capture_image()
            .map_err(|e| Self::x11_error("capture_image", e))?;

        if image.width() == 0 || image.height() == 0 {
            return Err(CaptureError::EmptyCapture {
                handle,
                width: image.width(),
                height: image.height(),
            });
        }

        PixelBuffer::from_rgba_image(&image).map_err(|e| Self::x11_error("convert_image", e))
    }

    fn backend_type(&self) -> BackendType {
        BackendType::X11
    }
}

impl ForegroundControl for X11Backend {
    fn foreground_window(&self) -> Option<WindowHandle> {
        match self.read_active_window() {
            Ok(active) => active,
            Err(e) => {
                tracing::warn!("Could not read _NET_ACTIVE_WINDOW: {}", e);
                None
            }
        }
    }

    fn set_foreground_window(&self, handle: WindowHandle) -> bool {
        let Ok(window) = window_id(handle) else {
            return false;
        };
        match self.request_activation(window) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Could not activate window {}: {}", handle, e);
                false
            }
        }
    }
}
