use winapi::ctypes::c_void;
use winapi::shared::winerror::{HRESULT, SUCCEEDED};
use winapi::um::unknwnbase::IUnknown;
use winapi::Interface;

use std::fmt;
use std::ops::Deref;
use std::ptr;

/// Owning COM interface pointer. Starts null when used as an out-parameter.
#[repr(transparent)]
pub struct ComPtr<T>(*mut T);

impl<T> ComPtr<T> {
    pub fn null() -> Self {
        Self(ptr::null_mut())
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    pub fn as_raw(&self) -> *mut T {
        self.0
    }

    /// Out-parameter slot for creation functions. Must only be used while null.
    pub unsafe fn as_mut_void(&mut self) -> *mut *mut c_void {
        debug_assert!(self.is_null());
        &mut self.0 as *mut *mut _ as *mut *mut _
    }

    fn as_unknown(&self) -> &IUnknown {
        debug_assert!(!self.is_null());
        unsafe { &*(self.as_raw() as *mut IUnknown) }
    }
}

impl<T> ComPtr<T>
where
    T: Interface,
{
    pub fn cast<U>(&self) -> Result<ComPtr<U>, HRESULT>
    where
        U: Interface,
    {
        let mut p = ComPtr::<U>::null();
        let hr = unsafe {
            self.as_unknown()
                .QueryInterface(&U::uuidof(), p.as_mut_void())
        };
        if SUCCEEDED(hr) {
            Ok(p)
        } else {
            Err(hr)
        }
    }
}

impl<T> Drop for ComPtr<T> {
    fn drop(&mut self) {
        if !self.is_null() {
            unsafe {
                self.as_unknown().Release();
            }
        }
    }
}

impl<T> Deref for ComPtr<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        debug_assert!(!self.is_null());
        unsafe { &*self.as_raw() }
    }
}

impl<T> fmt::Debug for ComPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

