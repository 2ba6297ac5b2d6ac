use std::io;

#[derive(Clone)]
pub struct Config {
    value: toml::Value,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            value: toml::Value::Table(toml::map::Map::new()),
        }
    }
}

impl Config {
    /// Get an entry by path. If the input argument contains dots, the path is split
    /// into keys, each key being requested recursively.
    pub fn get<T: AsRef<str>>(&self, k: T) -> Option<&str> {
        let mut item = &self.value;
        for key in k.as_ref().split('.') {
            item = item.get(key)?;
        }
        item.as_str()
    }

    /// Get an entry of type integer by path
    pub fn get_usize<T: AsRef<str>>(&self, k: T) -> Option<usize> {
        let mut item = &self.value;
        for key in k.as_ref().split('.') {
            item = item.get(key)?;
        }
        item.as_integer()
            .and_then(|i| if i >= 0 { Some(i as usize) } else { None })
    }

    /// Get an entry of type boolean by path
    pub fn get_bool<T: AsRef<str>>(&self, k: T) -> Option<bool> {
        let mut item = &self.value;
        for key in k.as_ref().split('.') {
            item = item.get(key)?;
        }
        item.as_bool()
    }

    /// Insert or overwrite an entry by path, creating intermediate tables as needed.
    /// The insertion is dropped if a path component exists but is not a table.
    pub fn set<T: Into<toml::Value>>(&mut self, k: &str, v: T) {
        let path: Vec<&str> = k.split('.').collect();
        let (last, parents) = match path.split_last() {
            Some(x) => x,
            None => return,
        };
        let mut table = match self.value.as_table_mut() {
            Some(t) => t,
            None => return,
        };
        for key in parents {
            let entry = table
                .entry(key.to_string())
                .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
            table = match entry.as_table_mut() {
                Some(t) => t,
                None => return,
            };
        }
        table.insert(last.to_string(), v.into());
    }

    /// Load configuration from input object. If keys are already present, they are overwritten
    pub fn load_config<R: io::Read>(&mut self, mut config: R) -> Result<(), io::Error> {
        let mut s = String::new();
        config.read_to_string(&mut s)?;
        match toml::from_str(&s) {
            Ok(value) => {
                self.value = value;
                Ok(())
            }
            _ => Err(io::Error::new(
                io::ErrorKind::Other,
                "Load configuration failed",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Config;
    use std::io::Cursor;

    #[test]
    fn config_get_dotted_path() {
        let mut config = Config::default();
        config
            .load_config(Cursor::new("[capture]\nmax_packets = 42\npromisc = false\n"))
            .unwrap();
        assert_eq!(config.get_usize("capture.max_packets"), Some(42));
        assert_eq!(config.get_bool("capture.promisc"), Some(false));
        assert_eq!(config.get_usize("capture.missing"), None);
    }

    #[test]
    fn config_set_creates_tables() {
        let mut config = Config::default();
        config.set("capture.sleep", 250_i64);
        config.set("name", "eth0");
        assert_eq!(config.get_usize("capture.sleep"), Some(250));
        assert_eq!(config.get("name"), Some("eth0"));
    }
}
