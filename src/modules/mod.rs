pub mod conversation {
    pub mod schema;
    pub mod model;
    pub mod repository;
    pub mod repository_pg;
    pub mod handle;
    pub mod service;
    pub mod route;
}

pub mod message {
    pub mod schema;
    pub mod model;
    pub mod repository;
    pub mod repository_pg;
    pub mod handle;
    pub mod service;
    pub mod route;
}

pub mod upload {
    pub mod schema;
    pub mod model;
    pub mod repository;
    pub mod repository_redis;
    pub mod storage;
    pub mod handle;
    pub mod service;
    pub mod route;
}
