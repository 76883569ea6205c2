//! Windows implementation of process resolution and memory access
//!
//! Process lookup goes through the Toolhelp32 snapshot API, reads through
//! `ReadProcessMemory`, and the snapshot provider walks the committed
//! writable regions reported by `VirtualQueryEx`. The window title comes
//! from the process's visible top-level windows.

use std::ffi::c_void;
use std::sync::Arc;

use tracing::{debug, trace};
use windows::Win32::Foundation::{BOOL, CloseHandle, HANDLE, HWND, LPARAM, STILL_ACTIVE, TRUE};
use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, PROCESSENTRY32W, Process32FirstW, Process32NextW, TH32CS_SNAPPROCESS,
};
use windows::Win32::System::Memory::{
    MEM_COMMIT, MEMORY_BASIC_INFORMATION, PAGE_EXECUTE_READWRITE, PAGE_GUARD, PAGE_NOACCESS,
    PAGE_READWRITE, PAGE_WRITECOPY, VirtualQueryEx,
};
use windows::Win32::System::Threading::{
    GetExitCodeProcess, OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetWindowTextW, GetWindowThreadProcessId, IsWindowVisible,
};

use crate::error::{Error, Result};
use crate::memory::ReadMemory;
use crate::process::{ProcessProvider, ProcessQuery};
use crate::scan::{Candidate, CandidateSet, SnapshotSource, ValueKind};

/// Largest chunk read from one memory region in a single call
const REGION_READ_CHUNK: usize = 1024 * 1024;

/// An open handle to the player process
pub struct WindowsProcess {
    pid: u32,
    handle: HANDLE,
    /// Snapshot prefilter: only finite values in `[0, max_timecode_secs]`
    /// are plausible timecodes
    max_timecode_secs: f64,
}

// HANDLE is a plain kernel object reference; reads are thread-safe.
unsafe impl Send for WindowsProcess {}
unsafe impl Sync for WindowsProcess {}

impl WindowsProcess {
    /// Find a process by executable name and open it for memory reading.
    pub fn open_by_name(name: &str, max_timecode_secs: f64) -> Result<Self> {
        let pid = find_pid_by_name(name)?
            .ok_or_else(|| Error::ProcessNotFound(name.to_string()))?;
        let handle = unsafe {
            OpenProcess(PROCESS_VM_READ | PROCESS_QUERY_INFORMATION, false, pid)
                .map_err(|e| Error::ProcessOpenFailed(format!("pid {pid}: {e}")))?
        };
        debug!(pid, name, "opened target process");
        Ok(Self {
            pid,
            handle,
            max_timecode_secs,
        })
    }
}

impl Drop for WindowsProcess {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.handle);
        }
    }
}

impl ProcessQuery for WindowsProcess {
    fn id(&self) -> u32 {
        self.pid
    }

    fn window_title(&self) -> Option<String> {
        main_window_title(self.pid)
    }

    fn is_alive(&self) -> bool {
        let mut code = 0u32;
        unsafe {
            GetExitCodeProcess(self.handle, &mut code).is_ok() && code == STILL_ACTIVE.0 as u32
        }
    }
}

impl ReadMemory for WindowsProcess {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; size];
        let mut read = 0usize;
        unsafe {
            ReadProcessMemory(
                self.handle,
                address as *const c_void,
                buffer.as_mut_ptr() as *mut c_void,
                size,
                Some(&mut read),
            )
            .map_err(|e| Error::MemoryReadFailed {
                address,
                message: e.to_string(),
            })?;
        }
        if read != size {
            return Err(Error::MemoryReadFailed {
                address,
                message: format!("short read: got {read} of {size} bytes"),
            });
        }
        Ok(buffer)
    }
}

impl SnapshotSource for WindowsProcess {
    /// Walk every committed writable region and collect the aligned f64
    /// cells holding a plausible timecode. The timecode lives on the heap,
    /// so read-only and image regions are skipped.
    fn snapshot(&self, kind: ValueKind) -> Result<CandidateSet> {
        let mut set = CandidateSet::new(kind);
        let cell = kind.size();
        let mut address = 0u64;
        let mut regions = 0usize;

        loop {
            let mut info = MEMORY_BASIC_INFORMATION::default();
            let written = unsafe {
                VirtualQueryEx(
                    self.handle,
                    Some(address as *const c_void),
                    &mut info,
                    std::mem::size_of::<MEMORY_BASIC_INFORMATION>(),
                )
            };
            if written == 0 {
                break;
            }

            let base = info.BaseAddress as u64;
            let region_size = info.RegionSize as u64;
            if region_size == 0 {
                break;
            }

            if info.State == MEM_COMMIT && is_scannable_protection(info.Protect.0) {
                regions += 1;
                let mut offset = 0u64;
                while offset < region_size {
                    let chunk = ((region_size - offset) as usize).min(REGION_READ_CHUNK);
                    let Ok(bytes) = self.read_bytes(base + offset, chunk) else {
                        break;
                    };
                    for (pos, chunk) in bytes.chunks_exact(cell).enumerate() {
                        let mut raw = [0u8; 8];
                        raw.copy_from_slice(chunk);
                        let value = f64::from_le_bytes(raw);
                        if value.is_finite() && value >= 0.0 && value <= self.max_timecode_secs {
                            set.push(Candidate {
                                address: base + offset + (pos * cell) as u64,
                                value,
                            });
                        }
                    }
                    offset += chunk as u64;
                }
            }

            address = base.saturating_add(region_size);
        }

        if set.is_empty() && regions == 0 {
            return Err(Error::SnapshotFailed(format!(
                "no readable regions in pid {}",
                self.pid
            )));
        }
        trace!(
            regions,
            candidates = set.len(),
            "memory snapshot complete"
        );
        Ok(set)
    }
}

fn is_scannable_protection(protect: u32) -> bool {
    if protect & (PAGE_GUARD.0 | PAGE_NOACCESS.0) != 0 {
        return false;
    }
    protect & (PAGE_READWRITE.0 | PAGE_EXECUTE_READWRITE.0 | PAGE_WRITECOPY.0) != 0
}

fn find_pid_by_name(name: &str) -> Result<Option<u32>> {
    let snapshot = unsafe {
        CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0)
            .map_err(|e| Error::ProcessOpenFailed(format!("process snapshot: {e}")))?
    };

    let mut entry = PROCESSENTRY32W {
        dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
        ..Default::default()
    };

    let mut found = None;
    unsafe {
        if Process32FirstW(snapshot, &mut entry).is_ok() {
            loop {
                let exe = utf16_until_nul(&entry.szExeFile);
                if exe_name_matches(&exe, name) {
                    found = Some(entry.th32ProcessID);
                    break;
                }
                if Process32NextW(snapshot, &mut entry).is_err() {
                    break;
                }
            }
        }
        let _ = CloseHandle(snapshot);
    }
    Ok(found)
}

/// Compare an executable name against the configured process name,
/// ignoring case and an optional `.exe` suffix.
fn exe_name_matches(exe: &str, name: &str) -> bool {
    let exe = exe.strip_suffix(".exe").unwrap_or(exe);
    let name = name.strip_suffix(".exe").unwrap_or(name);
    exe.eq_ignore_ascii_case(name)
}

fn utf16_until_nul(buffer: &[u16]) -> String {
    let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
    String::from_utf16_lossy(&buffer[..len])
}

struct TitleSearch {
    pid: u32,
    best: Option<String>,
}

/// Longest visible top-level window title owned by the pid. The player's
/// main window carries the track text; tool windows have short or empty
/// titles.
fn main_window_title(pid: u32) -> Option<String> {
    let mut search = TitleSearch { pid, best: None };
    unsafe {
        let _ = EnumWindows(
            Some(enum_windows_callback),
            LPARAM(&mut search as *mut TitleSearch as isize),
        );
    }
    search.best
}

extern "system" fn enum_windows_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let search = unsafe { &mut *(lparam.0 as *mut TitleSearch) };

    let mut window_pid = 0u32;
    unsafe {
        GetWindowThreadProcessId(hwnd, Some(&mut window_pid));
        if window_pid != search.pid || !IsWindowVisible(hwnd).as_bool() {
            return TRUE;
        }

        let mut buffer = [0u16; 512];
        let len = GetWindowTextW(hwnd, &mut buffer);
        if len > 0 {
            let title = String::from_utf16_lossy(&buffer[..len as usize]);
            let longer = search
                .best
                .as_ref()
                .is_none_or(|current| title.len() > current.len());
            if longer {
                search.best = Some(title);
            }
        }
    }
    TRUE
}

/// System-backed provider used by the CLI.
pub struct SystemProcessProvider {
    max_timecode_secs: f64,
}

impl SystemProcessProvider {
    pub fn new(max_timecode_secs: f64) -> Self {
        Self { max_timecode_secs }
    }
}

impl ProcessProvider for SystemProcessProvider {
    type Proc = WindowsProcess;

    fn resolve(&mut self, name: &str) -> Option<Arc<WindowsProcess>> {
        match WindowsProcess::open_by_name(name, self.max_timecode_secs) {
            Ok(process) => Some(Arc::new(process)),
            Err(Error::ProcessNotFound(_)) => None,
            Err(e) => {
                debug!("failed to open {}: {}", name, e);
                None
            }
        }
    }
}
