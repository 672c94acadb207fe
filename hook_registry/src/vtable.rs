use std::os::raw::c_void;
use std::sync::atomic::{AtomicUsize, Ordering};

use shared_gl::error::{HookError, Result};
use shared_gl::util::write_log_file;
use util::{protect_memory, unprotect_memory};

use crate::registry::{HookRecord, HookRegistry, HookStrategy, InterfaceId, Trampoline};

/// Whole-word store into a table slot.  The page is made writable for the duration and its
/// previous protection restored.
unsafe fn write_slot(slot: *mut usize, expect: usize, value: usize) -> Result<bool> {
    let size = std::mem::size_of::<usize>();
    let old_prot = unprotect_memory(slot as *mut c_void, size)?;
    let cell = &*(slot as *const AtomicUsize);
    let swapped = cell
        .compare_exchange(expect, value, Ordering::SeqCst, Ordering::SeqCst)
        .is_ok();
    protect_memory(slot as *mut c_void, size, old_prot)?;
    Ok(swapped)
}

unsafe fn read_slot(slot: *mut usize) -> usize {
    (*(slot as *const AtomicUsize)).load(Ordering::SeqCst)
}

/// Put the original back in every table of a slot record.  A table that can't be written stays in
/// the record, which then stays installed so a later uninstall retries just those; the others are
/// restored regardless.  Returns the first write error.
unsafe fn restore_tables<W>(interface: InterfaceId, slot: usize, rec: &mut HookRecord, mut write: W) -> Result<()>
where
    W: FnMut(*mut usize, usize, usize) -> Result<bool>,
{
    let mut failed = vec![];
    let mut first_err = None;
    for table in std::mem::take(&mut rec.tables) {
        let slot_ptr = (table as *mut usize).add(slot);
        match write(slot_ptr, rec.interceptor, rec.original) {
            Ok(true) => {}
            Ok(false) => write_log_file(&format!(
                "Warning: {:?}[{}] in table {:x} was replaced by a foreign hook, leaving it",
                interface, slot, table
            )),
            Err(e) => {
                write_log_file(&format!(
                    "Error: can't restore {:?}[{}] in table {:x}: {:?}",
                    interface, slot, table, e
                ));
                failed.push(table);
                first_err.get_or_insert(e);
            }
        }
    }
    rec.installed = !failed.is_empty();
    rec.tables = failed;
    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

impl HookRegistry {
    /// Point `slot` of a shared dispatch table at `interceptor`.  The hook is keyed by
    /// (interface, slot), so every object using that table is affected.  Another table of the
    /// same interface may be added later only if its slot holds the same original.
    ///
    /// # Safety
    /// `table` must point to a live dispatch table with more than `slot` entries.
    pub unsafe fn install_slot(
        &self,
        interface: InterfaceId,
        table: *mut usize,
        slot: usize,
        interceptor: usize,
    ) -> Result<Trampoline> {
        if table.is_null() || interceptor == 0 {
            return Err(HookError::UnsupportedEntry(format!(
                "{:?}[{}]: null table or interceptor",
                interface, slot
            )));
        }
        let slot_ptr = table.add(slot);
        let current = read_slot(slot_ptr);
        if current == 0 {
            return Err(HookError::UnsupportedEntry(format!(
                "{:?}[{}]: slot is empty",
                interface, slot
            )));
        }

        let mut tables = self.tables.write().map_err(|_err| HookError::GlobalLockError)?;
        let key = (interface, slot);
        let original = match tables.by_slot.get(&key) {
            Some(rec) if rec.installed && rec.interceptor != interceptor => {
                return Err(HookError::AlreadyInstalled);
            }
            Some(rec) if rec.installed => {
                if current == interceptor {
                    let original = rec.original;
                    if let Some(rec) = tables.by_slot.get_mut(&key) {
                        if !rec.tables.contains(&(table as usize)) {
                            rec.tables.push(table as usize);
                        }
                    }
                    return Ok(Trampoline(original));
                }
                if current != rec.original {
                    return Err(HookError::UnsupportedEntry(format!(
                        "{:?}[{}]: table {:x} holds {:x}, expected original {:x}",
                        interface, slot, table as usize, current, rec.original
                    )));
                }
                rec.original
            }
            Some(rec) if current == interceptor => rec.original,
            _ => {
                if current == interceptor {
                    return Err(HookError::UnsupportedEntry(format!(
                        "{:?}[{}]: slot already holds the interceptor",
                        interface, slot
                    )));
                }
                current
            }
        };

        if let Some(bound) = tables.by_interceptor.get(&interceptor) {
            if *bound != original {
                return Err(HookError::UnsupportedEntry(format!(
                    "interceptor {:x} already calls through to {:x}",
                    interceptor, bound
                )));
            }
        }

        if current != interceptor && !write_slot(slot_ptr, current, interceptor)? {
            return Err(HookError::UnsupportedEntry(format!(
                "{:?}[{}]: slot changed while hooking",
                interface, slot
            )));
        }

        let rec = tables.by_slot.entry(key).or_insert_with(|| HookRecord {
            original,
            interceptor,
            installed: true,
            strategy: HookStrategy::VirtualSlot { interface, slot },
            tables: vec![],
        });
        rec.original = original;
        rec.interceptor = interceptor;
        rec.installed = true;
        if !rec.tables.contains(&(table as usize)) {
            rec.tables.push(table as usize);
        }
        tables.by_interceptor.insert(interceptor, original);
        Ok(Trampoline(original))
    }

    /// Restore the original slot value in every patched table.  A slot that was since
    /// overwritten by someone else is left alone.  No-op if nothing is installed.  If some table
    /// can't be written the rest are still restored and the error is returned after.
    ///
    /// # Safety
    /// Every table passed to `install_slot` for this key must still be live.
    pub unsafe fn uninstall_slot(&self, interface: InterfaceId, slot: usize) -> Result<()> {
        let mut tables = self.tables.write().map_err(|_err| HookError::GlobalLockError)?;
        let rec = match tables.by_slot.get_mut(&(interface, slot)) {
            Some(rec) if rec.installed => rec,
            _ => return Ok(()),
        };
        restore_tables(interface, slot, rec, |slot_ptr, expect, value| {
            write_slot(slot_ptr, expect, value)
        })
    }

    pub fn slot_record(&self, interface: InterfaceId, slot: usize) -> Option<HookRecord> {
        let tables = self.tables.read().ok()?;
        tables.by_slot.get(&(interface, slot)).cloned()
    }
}
