use std::collections::HashMap;

/// Read-only annotation tables injected into the decoder.
///
/// `EventID` and `LogonType` values are purely numeric on the wire; these
/// tables let the renderer append the English description Windows would
/// show. Both lookups are optional; an unmapped value renders bare.
#[derive(Debug, Clone)]
pub struct EventTables {
    event_descriptions: HashMap<u16, &'static str>,
    logon_types: [Option<&'static str>; 12],
}

impl EventTables {
    /// Tables with no annotations at all.
    pub fn empty() -> Self {
        EventTables {
            event_descriptions: HashMap::new(),
            logon_types: [None; 12],
        }
    }

    /// The well-known Security-log event ids and logon types.
    pub fn windows_defaults() -> Self {
        let event_descriptions = WINDOWS_EVENT_DESCRIPTIONS.iter().copied().collect();

        // Indices 0, 1 and 6 are not defined by Windows.
        let logon_types = [
            None,
            None,
            Some("Interactive"),
            Some("Network"),
            Some("Batch"),
            Some("Service"),
            None,
            Some("Unlock"),
            Some("NetworkCleartext"),
            Some("NewCredentials"),
            Some("RemoteInteractive"),
            Some("CachedInteractive"),
        ];

        EventTables {
            event_descriptions,
            logon_types,
        }
    }

    pub fn with_event_description(mut self, event_id: u16, description: &'static str) -> Self {
        self.event_descriptions.insert(event_id, description);
        self
    }

    pub fn event_description(&self, event_id: u16) -> Option<&str> {
        self.event_descriptions.get(&event_id).copied()
    }

    pub fn logon_type(&self, value: u32) -> Option<&str> {
        if value > 11 {
            return None;
        }
        self.logon_types[value as usize]
    }
}

impl Default for EventTables {
    fn default() -> Self {
        EventTables::windows_defaults()
    }
}

const WINDOWS_EVENT_DESCRIPTIONS: &[(u16, &str)] = &[
    (1102, "The audit log was cleared"),
    (4608, "Windows is starting up"),
    (4616, "The system time was changed"),
    (4624, "An account was successfully logged on"),
    (4625, "An account failed to log on"),
    (4634, "An account was logged off"),
    (4647, "User initiated logoff"),
    (4648, "A logon was attempted using explicit credentials"),
    (4672, "Special privileges assigned to new logon"),
    (4688, "A new process has been created"),
    (4689, "A process has exited"),
    (4697, "A service was installed in the system"),
    (4698, "A scheduled task was created"),
    (4720, "A user account was created"),
    (4722, "A user account was enabled"),
    (4723, "An attempt was made to change an account's password"),
    (4724, "An attempt was made to reset an account's password"),
    (4725, "A user account was disabled"),
    (4726, "A user account was deleted"),
    (4732, "A member was added to a security-enabled local group"),
    (4740, "A user account was locked out"),
    (4768, "A Kerberos authentication ticket (TGT) was requested"),
    (4769, "A Kerberos service ticket was requested"),
    (4776, "The computer attempted to validate the credentials for an account"),
    (5140, "A network share object was accessed"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logon_type_gaps() {
        let tables = EventTables::windows_defaults();
        assert_eq!(tables.logon_type(2), Some("Interactive"));
        assert_eq!(tables.logon_type(10), Some("RemoteInteractive"));
        assert_eq!(tables.logon_type(0), None);
        assert_eq!(tables.logon_type(6), None);
        assert_eq!(tables.logon_type(12), None);
    }

    #[test]
    fn test_event_description_lookup() {
        let tables = EventTables::windows_defaults();
        assert_eq!(
            tables.event_description(4624),
            Some("An account was successfully logged on")
        );
        assert_eq!(tables.event_description(1), None);
    }

    #[test]
    fn test_caller_supplied_description_wins() {
        let tables = EventTables::empty().with_event_description(7, "custom");
        assert_eq!(tables.event_description(7), Some("custom"));
    }
}
