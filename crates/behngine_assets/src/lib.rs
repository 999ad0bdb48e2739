pub mod asset_server;
pub mod assets;
pub mod obj;
pub mod primitives;

pub use asset_server::{AssetError, AssetEvent, AssetServer};
pub use assets::{Assets, Handle, MeshData, Vertex};
pub use obj::{ObjError, ObjLoadOptions, ObjMesh, load_obj, parse_obj, parse_obj_str};
