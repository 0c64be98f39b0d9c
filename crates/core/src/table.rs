//! Table descriptors (Functional Core - pure data).

/// Provisioned capacity units for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throughput {
    pub read: i64,
    pub write: i64,
}

impl Default for Throughput {
    fn default() -> Self {
        Self { read: 5, write: 5 }
    }
}

/// Static metadata describing a model's backing table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: String,
    pub hash_key: String,
    pub range_key: Option<String>,
    pub throughput: Throughput,
}

impl TableDescriptor {
    /// A table keyed by `hash_key` alone, with default throughput.
    pub fn new(name: impl Into<String>, hash_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hash_key: hash_key.into(),
            range_key: None,
            throughput: Throughput::default(),
        }
    }

    pub fn with_range_key(mut self, range_key: impl Into<String>) -> Self {
        self.range_key = Some(range_key.into());
        self
    }

    pub fn with_throughput(mut self, read: i64, write: i64) -> Self {
        self.throughput = Throughput { read, write };
        self
    }

    /// Sets the table name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Hash key first, then the range key if there is one.
    pub fn key_names(&self) -> Vec<&str> {
        let mut names = vec![self.hash_key.as_str()];
        if let Some(range_key) = &self.range_key {
            names.push(range_key);
        }
        names
    }

    pub fn is_key(&self, name: &str) -> bool {
        self.hash_key == name || self.range_key.as_deref() == Some(name)
    }
}
