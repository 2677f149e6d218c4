use uuid::Uuid;

pub type HostId = Uuid;

/// A machine whose files are backed up
///
/// Workers reach the backup through it, so purge requests carry its address
/// and the root path its backups are stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    id: HostId,
    hostname: String,
    user: String,
    port: u16,
    path: String,
}

/// Row shape of the columns maintenance reads from `hosts`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HostRow {
    pub id: Uuid,
    pub hostname: String,
    pub user: String,
    pub port: i32,
    pub host_path: String,
}

impl Host {
    pub fn new(
        id: HostId,
        hostname: impl Into<String>,
        user: impl Into<String>,
        port: u16,
        path: impl Into<String>,
    ) -> Self {
        Self {
            id,
            hostname: hostname.into(),
            user: user.into(),
            port,
            path: path.into(),
        }
    }

    pub fn id(&self) -> HostId {
        self.id
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl TryFrom<HostRow> for Host {
    type Error = std::num::TryFromIntError;

    fn try_from(row: HostRow) -> Result<Self, Self::Error> {
        let port = u16::try_from(row.port)?;
        Ok(Self::new(row.id, row.hostname, row.user, port, row.host_path))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn row(port: i32) -> HostRow {
        HostRow {
            id: Uuid::new_v4(),
            hostname: "web-01.lan".to_string(),
            user: "backup".to_string(),
            port,
            host_path: "/mnt/backups/web-01".to_string(),
        }
    }

    #[test]
    fn host_from_row() {
        let row = row(2222);
        let host = Host::try_from(row.clone()).unwrap();

        assert_eq!(host.id(), row.id);
        assert_eq!(host.hostname(), "web-01.lan");
        assert_eq!(host.user(), "backup");
        assert_eq!(host.port(), 2222);
        assert_eq!(host.path(), "/mnt/backups/web-01");
    }

    #[test]
    fn out_of_range_port_is_rejected() {
        assert!(Host::try_from(row(-1)).is_err());
        assert!(Host::try_from(row(70_000)).is_err());
    }
}
