use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::fs;
use std::path::Path;

/// 本機檔案儲存：讀取路徑以工作目錄為準，寫入路徑以 `base_path` 為準
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let data = fs::read(Path::new(path))?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)?;
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let from = Path::new(&self.base_path).join(from);
        let to = Path::new(&self.base_path).join(to);

        if to.is_dir() {
            fs::remove_dir_all(&to)?;
        } else if to.exists() {
            fs::remove_file(&to)?;
        }
        fs::rename(from, to)?;
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if full_path.is_dir() {
            fs::remove_dir_all(full_path)?;
        } else if full_path.exists() {
            fs::remove_file(full_path)?;
        }
        Ok(())
    }
}
