use std::collections::BTreeSet;

use vetter_core::types::Principal;

/// Every caller, signed in or not.
pub const ANONYMOUS_USERS: &str = "anonymous-users";
/// Every caller with an account.
pub const REGISTERED_USERS: &str = "registered-users";
pub const ADMINISTRATORS: &str = "administrators";

/// Asserted groups plus the built-in ones implied by the principal's identity.
pub fn effective_groups(principal: &Principal) -> BTreeSet<&str> {
    let mut groups: BTreeSet<&str> = principal.groups().collect();
    groups.insert(ANONYMOUS_USERS);
    if principal.is_registered() {
        groups.insert(REGISTERED_USERS);
    }
    groups
}
