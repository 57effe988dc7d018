use crate::entry::{Principal, Privilege};
use crate::error::{StoreOp, UserRightsError};
use crate::iter::LsaArrayIterator;
use crate::store::{require_privileges, PolicyStore};
use crate::util::{
    check_status, from_lsa, pcwstr, wide, win32_error, LocalSid, UnicodeString,
    STATUS_NO_MORE_ENTRIES, STATUS_OBJECT_NAME_NOT_FOUND,
};
use std::collections::BTreeSet;
use std::ffi::c_void;
use std::fmt;
use std::ptr::null_mut;
use windows::core::{PCWSTR, PWSTR};
use windows::Win32::Foundation::{LocalFree, BOOLEAN, ERROR_INSUFFICIENT_BUFFER, HLOCAL, PSID};
use windows::Win32::Security::Authentication::Identity::{
    LsaAddAccountRights, LsaClose, LsaEnumerateAccountRights, LsaEnumerateAccountsWithUserRight,
    LsaOpenPolicy, LsaRemoveAccountRights, LSA_ENUMERATION_INFORMATION, LSA_HANDLE,
    LSA_OBJECT_ATTRIBUTES, LSA_UNICODE_STRING,
};
use windows::Win32::Security::Authorization::{ConvertSidToStringSidW, ConvertStringSidToSidW};
use windows::Win32::Security::{LookupAccountNameW, LookupAccountSidW, SID_NAME_USE};

/* Policy access rights, from ntsecapi.h */
const POLICY_VIEW_LOCAL_INFORMATION: u32 = 0x0000_0001;
const POLICY_CREATE_ACCOUNT: u32 = 0x0000_0010;
const POLICY_LOOKUP_NAMES: u32 = 0x0000_0800;

/// The Local Security Authority policy of a Windows host.
///
/// Principals are SID strings. Account names given to
/// [`resolve_principal()`](PolicyStore::resolve_principal) are looked up on the connected host.
#[derive(Default)]
pub struct LsaStore {
    handle: LSA_HANDLE,
    connected: bool,
    host: Option<Vec<u16>>,
}

impl fmt::Debug for LsaStore {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("LsaStore")
            .field("connected", &self.connected)
            .field(
                "host",
                &self
                    .host
                    .as_ref()
                    .map(|h| String::from_utf16_lossy(&h[..h.len() - 1])),
            )
            .finish()
    }
}

impl Drop for LsaStore {
    fn drop(&mut self) {
        if self.connected {
            unsafe {
                let _ = LsaClose(self.handle);
            }
        }
    }
}

impl LsaStore {
    #[must_use]
    pub fn new() -> LsaStore {
        LsaStore::default()
    }

    fn check_connected(&self) -> Result<(), UserRightsError> {
        if self.connected {
            Ok(())
        } else {
            Err(UserRightsError::NotConnected)
        }
    }

    fn translation_error(principal: &str, err: &windows::core::Error) -> UserRightsError {
        UserRightsError::TranslationError {
            err: win32_error(err),
            principal: principal.to_string(),
        }
    }

    /// Binary SID for a SID string.
    fn parse_sid(principal: &Principal) -> Result<LocalSid, UserRightsError> {
        let text = wide(principal.as_str());
        let mut sid = PSID::default();
        unsafe { ConvertStringSidToSidW(PCWSTR(text.as_ptr()), &mut sid) }
            .map_err(|err| Self::translation_error(principal.as_str(), &err))?;
        Ok(LocalSid(sid))
    }

    /// SID string for a binary SID.
    fn format_sid(sid: PSID) -> Result<Principal, UserRightsError> {
        let mut text = PWSTR::null();
        unsafe { ConvertSidToStringSidW(sid, &mut text) }
            .map_err(|err| Self::translation_error("SID", &err))?;
        let converted = unsafe { text.to_string() };
        unsafe {
            let _ = LocalFree(HLOCAL(text.0 as _));
        }
        converted
            .map(Principal::new)
            .map_err(|err| UserRightsError::TranslationError {
                err: std::io::Error::new(std::io::ErrorKind::InvalidData, err),
                principal: "SID".to_string(),
            })
    }

    fn change_rights(
        &mut self,
        op: StoreOp,
        principal: &Principal,
        privileges: &[Privilege],
    ) -> Result<(), UserRightsError> {
        self.check_connected()?;
        require_privileges(principal, privileges)?;
        let sid = Self::parse_sid(principal)?;
        let names: Vec<UnicodeString> = privileges
            .iter()
            .map(|p| UnicodeString::new(p.as_str()))
            .collect();
        let rights: Vec<LSA_UNICODE_STRING> = names.iter().map(UnicodeString::as_lsa).collect();
        let status = unsafe {
            match op {
                StoreOp::Grant => LsaAddAccountRights(self.handle, sid.0, &rights),
                _ => LsaRemoveAccountRights(self.handle, sid.0, BOOLEAN(0), Some(&rights)),
            }
        };
        check_status(status, op)
    }
}

impl PolicyStore for LsaStore {
    fn connect(&mut self, host: Option<&str>) -> Result<(), UserRightsError> {
        if self.connected {
            return Err(UserRightsError::AlreadyConnected);
        }
        let system = host.map(UnicodeString::new);
        let system_lsa = system.as_ref().map(UnicodeString::as_lsa);
        let attributes = LSA_OBJECT_ATTRIBUTES::default();
        let mut handle = LSA_HANDLE::default();
        let status = unsafe {
            LsaOpenPolicy(
                system_lsa.as_ref().map(|s| s as *const LSA_UNICODE_STRING),
                &attributes,
                POLICY_VIEW_LOCAL_INFORMATION | POLICY_CREATE_ACCOUNT | POLICY_LOOKUP_NAMES,
                &mut handle,
            )
        };
        check_status(status, StoreOp::Connect)?;
        self.handle = handle;
        self.host = host.map(wide);
        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn privileges_of(&self, principal: &Principal) -> Result<BTreeSet<Privilege>, UserRightsError> {
        self.check_connected()?;
        let sid = Self::parse_sid(principal)?;
        let mut rights: *mut LSA_UNICODE_STRING = null_mut();
        let mut count = 0u32;
        let status = unsafe { LsaEnumerateAccountRights(self.handle, sid.0, &mut rights, &mut count) };
        let iter = unsafe { LsaArrayIterator::new(rights, count) };
        // Accounts without any rights do not exist in the policy.
        if status == STATUS_OBJECT_NAME_NOT_FOUND {
            return Ok(BTreeSet::new());
        }
        check_status(status, StoreOp::Enumerate)?;
        Ok(iter.map(|right| Privilege::new(from_lsa(&right))).collect())
    }

    fn principals_with(
        &self,
        privilege: Option<&Privilege>,
    ) -> Result<BTreeSet<Principal>, UserRightsError> {
        self.check_connected()?;
        let right = privilege.map(|p| UnicodeString::new(p.as_str()));
        let right_lsa = right.as_ref().map(UnicodeString::as_lsa);
        let mut buffer: *mut c_void = null_mut();
        let mut count = 0u32;
        let status = unsafe {
            LsaEnumerateAccountsWithUserRight(
                self.handle,
                right_lsa.as_ref().map(|s| s as *const LSA_UNICODE_STRING),
                &mut buffer,
                &mut count,
            )
        };
        let iter =
            unsafe { LsaArrayIterator::new(buffer as *mut LSA_ENUMERATION_INFORMATION, count) };
        if status == STATUS_NO_MORE_ENTRIES {
            return Ok(BTreeSet::new());
        }
        check_status(status, StoreOp::Enumerate)?;
        iter.map(|info| Self::format_sid(info.Sid)).collect()
    }

    fn grant(
        &mut self,
        principal: &Principal,
        privileges: &[Privilege],
    ) -> Result<(), UserRightsError> {
        self.change_rights(StoreOp::Grant, principal, privileges)
    }

    fn revoke(
        &mut self,
        principal: &Principal,
        privileges: &[Privilege],
    ) -> Result<(), UserRightsError> {
        self.change_rights(StoreOp::Revoke, principal, privileges)
    }

    fn display_name(&self, principal: &Principal) -> Result<String, UserRightsError> {
        self.check_connected()?;
        let sid = Self::parse_sid(principal)?;
        let system = pcwstr(self.host.as_ref());
        let mut name_len = 0u32;
        let mut domain_len = 0u32;
        let mut use_ = SID_NAME_USE::default();
        // First call only reports the buffer sizes.
        if let Err(err) = unsafe {
            LookupAccountSidW(
                system,
                sid.0,
                PWSTR::null(),
                &mut name_len,
                PWSTR::null(),
                &mut domain_len,
                &mut use_,
            )
        } {
            if err.code() != ERROR_INSUFFICIENT_BUFFER.to_hresult() {
                return Err(Self::translation_error(principal.as_str(), &err));
            }
        }
        let mut name = vec![0u16; name_len as usize];
        let mut domain = vec![0u16; domain_len as usize];
        unsafe {
            LookupAccountSidW(
                system,
                sid.0,
                PWSTR(name.as_mut_ptr()),
                &mut name_len,
                PWSTR(domain.as_mut_ptr()),
                &mut domain_len,
                &mut use_,
            )
        }
        .map_err(|err| Self::translation_error(principal.as_str(), &err))?;

        let name = String::from_utf16_lossy(&name[..name_len as usize]);
        let domain = String::from_utf16_lossy(&domain[..domain_len as usize]);
        Ok(if domain.is_empty() {
            name
        } else {
            format!("{}\\{}", domain, name)
        })
    }

    fn resolve_principal(&self, text: &str) -> Result<Principal, UserRightsError> {
        let principal = Principal::new(text);
        if principal.is_sid() {
            // Round-trip to the form enumeration returns, e.g. without leading zeros.
            let sid = Self::parse_sid(&principal)?;
            return Self::format_sid(sid.0);
        }
        let text = principal.as_str();
        self.check_connected()?;
        let system = pcwstr(self.host.as_ref());
        let account = wide(text);
        let mut sid_len = 0u32;
        let mut domain_len = 0u32;
        let mut use_ = SID_NAME_USE::default();
        if let Err(err) = unsafe {
            LookupAccountNameW(
                system,
                PCWSTR(account.as_ptr()),
                PSID::default(),
                &mut sid_len,
                PWSTR::null(),
                &mut domain_len,
                &mut use_,
            )
        } {
            if err.code() != ERROR_INSUFFICIENT_BUFFER.to_hresult() {
                return Err(Self::translation_error(text, &err));
            }
        }
        let mut sid = vec![0u8; sid_len as usize];
        let mut domain = vec![0u16; domain_len as usize];
        unsafe {
            LookupAccountNameW(
                system,
                PCWSTR(account.as_ptr()),
                PSID(sid.as_mut_ptr() as *mut c_void),
                &mut sid_len,
                PWSTR(domain.as_mut_ptr()),
                &mut domain_len,
                &mut use_,
            )
        }
        .map_err(|err| Self::translation_error(text, &err))?;
        Self::format_sid(PSID(sid.as_mut_ptr() as *mut c_void))
    }
}
