//! Multi-handle concurrency: each thread opens its own [`Repository`], per
//! the single-threaded-per-handle design — callers wanting parallelism open
//! independent handles rather than sharing one across threads.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::thread;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use vcs_hash::hasher::Hasher;
use vcs_hash::ObjectId;
use vcs_object::Object;
use vcs_pack::entry::encode_entry_header;
use vcs_pack::{IDX_SIGNATURE, IDX_VERSION, PACK_SIGNATURE, PACK_VERSION};
use vcs_repository::Repository;

fn zlib(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut enc = ZlibEncoder::new(&mut out, Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap();
    out
}

fn init_bare(dir: &Path) {
    fs::create_dir_all(dir.join("objects").join("pack")).unwrap();
    fs::write(dir.join("HEAD"), "ref: refs/heads/main\n").unwrap();
}

fn write_loose_blob(objects_dir: &Path, content: &[u8]) -> ObjectId {
    let header = format!("blob {}\0", content.len());
    let mut raw = header.into_bytes();
    raw.extend_from_slice(content);
    let oid = Hasher::digest(&raw).unwrap();
    let compressed = zlib(&raw);
    let hex = oid.to_hex();
    let dir = objects_dir.join(&hex[..2]);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(&hex[2..]), compressed).unwrap();
    oid
}

fn build_idx(entries: &[(ObjectId, u64, u32)], pack_checksum: &[u8]) -> Vec<u8> {
    let mut sorted: Vec<_> = entries.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut buf = Vec::new();
    buf.extend_from_slice(&IDX_SIGNATURE);
    buf.extend_from_slice(&IDX_VERSION.to_be_bytes());

    let mut fanout = [0u32; 256];
    for (oid, _, _) in &sorted {
        fanout[oid.first_byte() as usize] += 1;
    }
    for i in 1..256 {
        fanout[i] += fanout[i - 1];
    }
    for count in fanout {
        buf.extend_from_slice(&count.to_be_bytes());
    }
    for (oid, _, _) in &sorted {
        buf.extend_from_slice(oid.as_bytes());
    }
    for (_, _, crc) in &sorted {
        buf.extend_from_slice(&crc.to_be_bytes());
    }
    for (_, offset, _) in &sorted {
        buf.extend_from_slice(&(*offset as u32).to_be_bytes());
    }
    buf.extend_from_slice(pack_checksum);

    let idx_checksum = {
        let mut h = Hasher::new();
        h.update(&buf);
        h.finalize().unwrap()
    };
    buf.extend_from_slice(idx_checksum.as_bytes());
    buf
}

fn write_plain_pack(pack_dir: &Path, name: &str, objects: &[Vec<u8>]) -> Vec<ObjectId> {
    let pack_path = pack_dir.join(format!("{name}.pack"));
    let idx_path = pack_dir.join(format!("{name}.idx"));

    let mut pack_data = Vec::new();
    pack_data.extend_from_slice(PACK_SIGNATURE);
    pack_data.extend_from_slice(&PACK_VERSION.to_be_bytes());
    pack_data.extend_from_slice(&(objects.len() as u32).to_be_bytes());

    let mut entries = Vec::new();
    for content in objects {
        let offset = pack_data.len() as u64;
        let header = encode_entry_header(3, content.len() as u64);
        let compressed = zlib(content);

        let mut crc_hasher = crc32fast::Hasher::new();
        crc_hasher.update(&header);
        crc_hasher.update(&compressed);

        let oid = Hasher::hash_object("blob", content).unwrap();
        pack_data.extend_from_slice(&header);
        pack_data.extend_from_slice(&compressed);
        entries.push((oid, offset, crc_hasher.finalize()));
    }

    let checksum = {
        let mut h = Hasher::new();
        h.update(&pack_data);
        h.finalize().unwrap()
    };
    pack_data.extend_from_slice(checksum.as_bytes());
    fs::write(&pack_path, &pack_data).unwrap();
    fs::write(&idx_path, build_idx(&entries, checksum.as_bytes())).unwrap();

    entries.into_iter().map(|(oid, _, _)| oid).collect()
}

#[test]
fn independent_handles_read_loose_objects_concurrently() {
    let dir = tempfile::tempdir().unwrap();
    init_bare(dir.path());
    let objects_dir = dir.path().join("objects");

    let mut oids = Vec::new();
    let mut contents = Vec::new();
    for i in 0..50 {
        let content = format!("concurrent test object {i}\n").into_bytes();
        let oid = write_loose_blob(&objects_dir, &content);
        oids.push(oid);
        contents.push(content);
    }

    let root = dir.path().to_path_buf();
    let mut handles = Vec::new();
    for thread_id in 0..10 {
        let root = root.clone();
        let oids = oids.clone();
        let contents = contents.clone();

        handles.push(thread::spawn(move || {
            let repo = Repository::open(&root).unwrap();
            for (i, oid) in oids.iter().enumerate() {
                let obj = repo.open_object(oid).unwrap();
                match obj {
                    Object::Blob(blob) => {
                        assert_eq!(
                            blob.data, contents[i],
                            "thread {thread_id} got wrong content for object {i}"
                        );
                    }
                    other => panic!(
                        "thread {thread_id} expected blob, got {:?}",
                        other.object_type()
                    ),
                }
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn independent_handles_read_packed_objects_concurrently() {
    let dir = tempfile::tempdir().unwrap();
    init_bare(dir.path());
    let objects_dir = dir.path().join("objects");

    let contents: Vec<Vec<u8>> = (0..50)
        .map(|i| format!("packed concurrent object {i}\n").into_bytes())
        .collect();
    let oids = write_plain_pack(&objects_dir.join("pack"), "p", &contents);

    let root = dir.path().to_path_buf();
    let mut handles = Vec::new();
    for thread_id in 0..10 {
        let root = root.clone();
        let oids = oids.clone();
        let contents = contents.clone();

        handles.push(thread::spawn(move || {
            let repo = Repository::open(&root).unwrap();
            for (i, oid) in oids.iter().enumerate() {
                let (_, data) = repo.extract_to_mem(oid).unwrap();
                assert_eq!(
                    data, contents[i],
                    "thread {thread_id} got wrong content for packed object {i}"
                );
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn independent_handles_check_existence_concurrently() {
    let dir = tempfile::tempdir().unwrap();
    init_bare(dir.path());
    let objects_dir = dir.path().join("objects");

    let existing_oids: Vec<ObjectId> = (0..20)
        .map(|i| write_loose_blob(&objects_dir, format!("exists check {i}\n").as_bytes()))
        .collect();
    let missing_oid = ObjectId::from_hex("0000000000000000000000000000000000000000").unwrap();

    let root = dir.path().to_path_buf();
    let mut handles = Vec::new();
    for _ in 0..10 {
        let root = root.clone();
        let existing_oids = existing_oids.clone();

        handles.push(thread::spawn(move || {
            let repo = Repository::open(&root).unwrap();
            for oid in &existing_oids {
                assert!(repo.contains(oid), "should find existing object");
            }
            assert!(!repo.contains(&missing_oid), "should not find missing object");
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn independent_handles_read_mixed_loose_packed_concurrently() {
    let dir = tempfile::tempdir().unwrap();
    init_bare(dir.path());
    let objects_dir = dir.path().join("objects");

    let packed_contents: Vec<Vec<u8>> = (0..25)
        .map(|i| format!("packed obj {i}\n").into_bytes())
        .collect();
    let packed_oids = write_plain_pack(&objects_dir.join("pack"), "p", &packed_contents);

    let loose_oids: Vec<ObjectId> = (0..25)
        .map(|i| write_loose_blob(&objects_dir, format!("loose obj {i}\n").as_bytes()))
        .collect();

    let all_oids: Vec<ObjectId> = packed_oids.into_iter().chain(loose_oids).collect();

    let root = dir.path().to_path_buf();
    let mut handles = Vec::new();
    for _ in 0..10 {
        let root = root.clone();
        let all_oids = all_oids.clone();

        handles.push(thread::spawn(move || {
            let repo = Repository::open(&root).unwrap();
            for oid in &all_oids {
                assert!(repo.contains(oid));
                repo.open_object(oid).unwrap();
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
}
