pub const UPLOAD_KEY_PREFIX: &str = "upload";
pub const DEFAULT_UPLOAD_FOLDER: &str = "podcasts";

pub struct Env {
    pub jwt_secret: String,
    pub database_url: String,
    pub redis_url: String,
    pub frontend_url: String,
    pub ip: String,
    pub port: u16,
    pub session_cookie: String,
    pub upload_dir: String,
    pub upload_base_url: String,
    pub upload_ttl: u64,
    pub max_chunk_size: usize,
}

impl Env {
    fn new() -> Self {
        let jwt_secret = std::env::var("SECRET_KEY")
            .expect("SECRET_KEY must be set in .env file or environment variable");

        let database_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set in .env file or environment variable");
        let redis_url = std::env::var("REDIS_URL")
            .expect("REDIS_URL must be set in .env file or environment variable");

        let frontend_url =
            std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());
        let ip = std::env::var("IP").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .expect("PORT must be a valid u16 integer");

        let session_cookie =
            std::env::var("SESSION_COOKIE").unwrap_or_else(|_| "session_token".to_string());

        let upload_dir = std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string());
        let upload_base_url =
            std::env::var("UPLOAD_BASE_URL").unwrap_or_else(|_| "/files".to_string());
        let upload_ttl = std::env::var("UPLOAD_TTL")
            .unwrap_or_else(|_| "86400".to_string())
            .parse::<u64>()
            .expect("UPLOAD_TTL must be a valid u64 integer");
        let max_chunk_size = std::env::var("MAX_CHUNK_SIZE")
            .unwrap_or_else(|_| (10 * 1024 * 1024).to_string())
            .parse::<usize>()
            .expect("MAX_CHUNK_SIZE must be a valid usize integer");

        Env {
            jwt_secret,
            database_url,
            redis_url,
            frontend_url,
            ip,
            port,
            session_cookie,
            upload_dir,
            upload_base_url,
            upload_ttl,
            max_chunk_size,
        }
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}
