use vcs_hash::hasher::Hasher;
use vcs_hash::ObjectId;

#[test]
fn empty_input_matches_known_sha1() {
    let oid = Hasher::digest(b"").unwrap();
    assert_eq!(oid.to_hex(), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
}

#[test]
fn abc_matches_known_sha1() {
    let oid = Hasher::digest(b"abc").unwrap();
    assert_eq!(oid.to_hex(), "a9993e364706816aba3e25717850c26c9cd0d89d");
}

#[test]
fn streaming_update_matches_one_shot_digest() {
    let mut h = Hasher::new();
    h.update(b"hello ");
    h.update(b"world");
    let streamed = h.finalize().unwrap();

    let one_shot = Hasher::digest(b"hello world").unwrap();
    assert_eq!(streamed, one_shot);
}

#[test]
fn hash_object_blob_matches_known_sha1() {
    let oid = Hasher::hash_object("blob", b"hello\n").unwrap();
    assert_eq!(oid.to_hex(), "ce013625030ba8dba906f756967f9e9ca394464a");
}

#[test]
fn hash_object_differs_by_type() {
    let blob = Hasher::hash_object("blob", b"same content").unwrap();
    let tree = Hasher::hash_object("tree", b"same content").unwrap();
    assert_ne!(blob, tree);
}

#[test]
fn digest_roundtrips_through_object_id_hex() {
    let oid = Hasher::digest(b"round trip me").unwrap();
    let parsed: ObjectId = oid.to_hex().parse().unwrap();
    assert_eq!(oid, parsed);
}
