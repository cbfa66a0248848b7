use std::path::PathBuf;

#[derive(Clone)]
pub struct Config {
    /// Absent key selects demo mode: the interpreter answers with a fixed
    /// spec instead of calling the model.
    pub claude_api_key: Option<String>,
    pub upload_folder: PathBuf,
    pub generated_folder: PathBuf,
    pub host: String,
    pub port: u16,
    /// Base for the verification URL embedded in QR codes.
    pub verify_base_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let claude_api_key = std::env::var("CLAUDE_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let upload_folder =
            base_dir.join(std::env::var("UPLOAD_FOLDER").unwrap_or_else(|_| "data".to_string()));
        let generated_folder = base_dir.join(
            std::env::var("GENERATED_FOLDER").unwrap_or_else(|_| "generated".to_string()),
        );

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .unwrap_or(5000);

        let verify_base_url = std::env::var("VERIFY_BASE_URL")
            .unwrap_or_else(|_| "https://yourdomain.com".to_string());

        Self {
            claude_api_key,
            upload_folder,
            generated_folder,
            host,
            port,
            verify_base_url,
        }
    }

}
