//! Windows window-system backend using Win32 + GDI
//!
//! This module implements the collaborator traits for Windows:
//!
//! - **Foreground control**: `GetForegroundWindow` / `SetForegroundWindow`
//! - **Validation**: `IsWindow` and `IsIconic` reject stale and minimized
//!   windows before any pixels are read
//! - **Capture**: the window rectangle from `GetWindowRect` is copied off the
//!   screen DC with `BitBlt` into a top-down 32-bit DIB section, which is
//!   already BGRA in memory
//!
//! Capturing from the screen means overlapping windows show up in the
//! result; the detector raises the target first for that reason.

use std::{ffi::c_void, mem, ptr};

use windows_sys::Win32::{
    Foundation::{HWND, RECT},
    Graphics::Gdi::{
        BI_RGB, BITMAPINFO, BITMAPINFOHEADER, BitBlt, CreateCompatibleDC, CreateDIBSection,
        DIB_RGB_COLORS, DeleteDC, DeleteObject, GetDC, ReleaseDC, SRCCOPY, SelectObject,
    },
    UI::WindowsAndMessaging::{
        GetForegroundWindow, GetWindowRect, IsIconic, IsWindow, SetForegroundWindow,
    },
};

#[allow(clippy::upper_case_acronyms)]
type BOOL = i32;
const FALSE: BOOL = 0;

use super::{ForegroundControl, WindowCapture};
use crate::{
    buffer::{BYTES_PER_PIXEL, PixelBuffer},
    error::{CaptureError, CaptureResult},
    model::{BackendType, WindowHandle},
};

fn to_hwnd(handle: WindowHandle) -> HWND {
    handle.0 as usize as HWND
}

fn from_hwnd(hwnd: HWND) -> WindowHandle {
    WindowHandle(hwnd as usize as u64)
}

fn platform_error(operation: &str) -> CaptureError {
    CaptureError::Platform {
        operation: operation.to_string(),
        reason:    std::io::Error::last_os_error().to_string(),
    }
}

/// Windows backend using Win32 window calls and GDI screen copies
///
/// Stateless; every call goes straight to the window manager.
#[derive(Debug, Default)]
pub struct WindowsBackend {
    _private: (),
}

impl WindowsBackend {
    /// Creates a new WindowsBackend instance
    pub fn new() -> CaptureResult<Self> {
        Ok(Self { _private: () })
    }

    /// Returns the window's screen rectangle
    fn window_rect(hwnd: HWND) -> CaptureResult<RECT> {
        // SAFETY: RECT is plain data; GetWindowRect writes into it
        let mut rect: RECT = unsafe { mem::zeroed() };
        if unsafe { GetWindowRect(hwnd, &mut rect) } == FALSE {
            return Err(platform_error("GetWindowRect"));
        }
        Ok(rect)
    }

    /// Copies a screen rectangle into a tightly packed BGRA buffer
    fn copy_from_screen(x: i32, y: i32, width: i32, height: i32) -> CaptureResult<Vec<u8>> {
        // SAFETY: every handle acquired below is released before returning,
        // and the DIB bits are copied out before the bitmap is deleted.
        unsafe {
            let screen_dc = GetDC(ptr::null_mut());
            if screen_dc.is_null() {
                return Err(platform_error("GetDC"));
            }
            let mem_dc = CreateCompatibleDC(screen_dc);
            if mem_dc.is_null() {
                ReleaseDC(ptr::null_mut(), screen_dc);
                return Err(platform_error("CreateCompatibleDC"));
            }

            let mut info: BITMAPINFO = mem::zeroed();
            info.bmiHeader = BITMAPINFOHEADER {
                biSize: mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width,
                // Negative height asks for a top-down DIB
                biHeight: -height,
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB,
                ..mem::zeroed()
            };

            let mut bits: *mut c_void = ptr::null_mut();
            let bitmap = CreateDIBSection(
                screen_dc,
                &info,
                DIB_RGB_COLORS,
                &mut bits,
                ptr::null_mut(),
                0,
            );
            if bitmap.is_null() || bits.is_null() {
                DeleteDC(mem_dc);
                ReleaseDC(ptr::null_mut(), screen_dc);
                return Err(platform_error("CreateDIBSection"));
            }

            let previous = SelectObject(mem_dc, bitmap);
            let copied = BitBlt(mem_dc, 0, 0, width, height, screen_dc, x, y, SRCCOPY);

            let len = width as usize * height as usize * BYTES_PER_PIXEL;
            let result = if copied == FALSE {
                Err(platform_error("BitBlt"))
            } else {
                let mut data = std::slice::from_raw_parts(bits as *const u8, len).to_vec();
                // GDI leaves alpha undefined; screen pixels are opaque
                for px in data.chunks_exact_mut(BYTES_PER_PIXEL) {
                    px[3] = 255;
                }
                Ok(data)
            };

            SelectObject(mem_dc, previous);
            DeleteObject(bitmap);
            DeleteDC(mem_dc);
            ReleaseDC(ptr::null_mut(), screen_dc);
            result
        }
    }
}

impl WindowCapture for WindowsBackend {
    fn capture_window_pixels(&self, handle: WindowHandle) -> CaptureResult<PixelBuffer> {
        let hwnd = to_hwnd(handle);

        // SAFETY: IsWindow and IsIconic accept arbitrary handle values
        if unsafe { IsWindow(hwnd) } == FALSE {
            return Err(CaptureError::InvalidHandle { handle });
        }
        if unsafe { IsIconic(hwnd) } != FALSE {
            return Err(CaptureError::Minimized { handle });
        }

        let rect = Self::window_rect(hwnd)?;
        let width = rect.right - rect.left;
        let height = rect.bottom - rect.top;
        if width <= 0 || height <= 0 {
            return Err(CaptureError::EmptyCapture {
                handle,
                width: width.max(0) as u32,
                height: height.max(0) as u32,
            });
        }

        tracing::debug!(
            "Capturing window {} at ({}, {}) size {}x{}",
            handle,
            rect.left,
            rect.top,
            width,
            height
        );
        let data = Self::copy_from_screen(rect.left, rect.top, width, height)?;

        PixelBuffer::from_raw(
            width as u32,
            height as u32,
            width as usize * BYTES_PER_PIXEL,
            data,
        )
        .map_err(|e| CaptureError::Platform {
            operation: "copy_from_screen".to_string(),
            reason:    e.to_string(),
        })
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Windows
    }
}

impl ForegroundControl for WindowsBackend {
    fn foreground_window(&self) -> Option<WindowHandle> {
        // SAFETY: no arguments; returns null when no window is active
        let hwnd = unsafe { GetForegroundWindow() };
        if hwnd.is_null() { None } else { Some(from_hwnd(hwnd)) }
    }

    fn set_foreground_window(&self, handle: WindowHandle) -> bool {
        // SAFETY: SetForegroundWindow validates the handle itself
        unsafe { SetForegroundWindow(to_hwnd(handle)) != FALSE }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_backend_new() {
        let backend = WindowsBackend::new();
        assert!(backend.is_ok());
        assert_eq!(backend.unwrap().backend_type(), BackendType::Windows);
    }

    #[test]
    fn test_capture_invalid_handle() {
        let backend = WindowsBackend::new().unwrap();
        let result = backend.capture_window_pixels(WindowHandle(0));
        assert!(matches!(result, Err(CaptureError::InvalidHandle { .. })));
    }

    #[test]
    fn test_hwnd_conversion_roundtrip() {
        let handle = WindowHandle(0x0012_0456);
        assert_eq!(from_hwnd(to_hwnd(handle)), handle);
    }

    #[test]
    fn test_backend_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<WindowsBackend>();
        assert_sync::<WindowsBackend>();
    }
}
