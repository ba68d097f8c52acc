use zktx_core::boundary::{
    BalanceProofArgs, DepositProofArgs, WithdrawProofArgs, decrypt_shielding_note,
    encrypt_shielding_note, gen_commitment, gen_convert_proof, gen_deposit_proof,
    gen_header_commitment, gen_nullifier, gen_redeem_proof, gen_root, gen_shielding_commitment,
    gen_withdraw_proof, verify_convert_proof, verify_deposit_proof, verify_redeem_proof,
    verify_withdraw_proof,
};
use zktx_core::codec::encode_hex;
use zktx_core::{Error, MockOracle, RecipientKeyHash, RecipientKeys, ValidationError};

fn u256(n: u64) -> String {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&n.to_le_bytes());
    encode_hex(&bytes)
}

const RECIPIENT: &str = "0x0102030405060708090a0b0c0d0e0f1011121314";

/// Hex inputs of one withdraw: old note 10, shielding 5, new note 15
struct Fixture {
    serial_old: String,
    randomness_old: String,
    serial_new: String,
    randomness_new: String,
    serial_s: String,
    randomness_s: String,
    commit_old: String,
    commit_new: String,
    commit_s: String,
    blob: String,
    n: usize,
    prev_ref: String,
    next_ref: String,
    header: String,
}

fn fixture() -> Fixture {
    let serial_old = u256(100);
    let randomness_old = u256(101);
    let serial_new = u256(200);
    let randomness_new = u256(201);
    let serial_s = u256(300);
    let randomness_s = u256(301);

    let commit_old = gen_commitment(10, &serial_old, &randomness_old).unwrap();
    let commit_new = gen_commitment(15, &serial_new, &randomness_new).unwrap();
    let commit_s =
        gen_shielding_commitment(5, RECIPIENT, &serial_s, &randomness_s, &serial_old).unwrap();

    let mut blob = String::new();
    for n in 0..16u64 {
        if n == 9 {
            blob.push_str(&commit_s);
        } else {
            blob.push_str(&gen_commitment(n, &u256(n), &u256(n)).unwrap());
        }
    }
    let root = gen_root(&blob, 16).unwrap();
    let prev_ref = u256(7);
    let next_ref = u256(8);
    let header = gen_header_commitment(&prev_ref, &next_ref, &root).unwrap();

    Fixture {
        serial_old,
        randomness_old,
        serial_new,
        randomness_new,
        serial_s,
        randomness_s,
        commit_old,
        commit_new,
        commit_s,
        blob,
        n: 16,
        prev_ref,
        next_ref,
        header,
    }
}

fn withdraw_args(f: &Fixture, value: u64) -> WithdrawProofArgs<'_> {
    WithdrawProofArgs {
        root_hex: &f.prev_ref,
        ledger_root_hex: &f.next_ref,
        value,
        value_old: 10,
        serial_old_hex: &f.serial_old,
        randomness_old_hex: &f.randomness_old,
        serial_hex: &f.serial_new,
        randomness_hex: &f.randomness_new,
        serial_s_hex: &f.serial_s,
        randomness_s_hex: &f.randomness_s,
        commit_old_hex: &f.commit_old,
        commit_new_hex: &f.commit_new,
        value_s: 5,
        recipient_hex: RECIPIENT,
        consumed_serial_hex: &f.serial_old,
        shielding_commit_hex: &f.commit_s,
        commitments_blob: &f.blob,
        n: f.n,
        header_hex: &f.header,
    }
}

#[test]
fn withdraw_roundtrip_through_hex() {
    let oracle = MockOracle::new();
    let f = fixture();
    let proof = gen_withdraw_proof(&oracle, &withdraw_args(&f, 15))
        .unwrap()
        .expect("satisfiable withdraw");
    let nullifier = gen_nullifier(&f.serial_old, &f.randomness_old).unwrap();

    assert!(
        verify_withdraw_proof(&oracle, &proof, &f.header, RECIPIENT, &f.commit_old, &nullifier, &f.commit_new)
            .unwrap()
    );

    let other_recipient = "0x0000000000000000000000000000000000000000";
    assert!(
        !verify_withdraw_proof(&oracle, &proof, &f.header, other_recipient, &f.commit_old, &nullifier, &f.commit_new)
            .unwrap()
    );

    let other_nullifier = gen_nullifier(&f.serial_old, &u256(5)).unwrap();
    assert!(
        !verify_withdraw_proof(&oracle, &proof, &f.header, RECIPIENT, &f.commit_old, &other_nullifier, &f.commit_new)
            .unwrap()
    );
}

#[test]
fn withdraw_header_over_unrelated_root_fails() {
    let oracle = MockOracle::new();
    let f = fixture();
    let proof = gen_withdraw_proof(&oracle, &withdraw_args(&f, 15))
        .unwrap()
        .expect("satisfiable withdraw");
    let nullifier = gen_nullifier(&f.serial_old, &f.randomness_old).unwrap();

    let mut small = String::new();
    for n in 0..4u64 {
        small.push_str(&gen_commitment(n, &u256(n + 50), &u256(n)).unwrap());
    }
    let unrelated_root = gen_root(&small, 4).unwrap();
    let forged_header = gen_header_commitment(&f.prev_ref, &f.next_ref, &unrelated_root).unwrap();

    assert!(
        !verify_withdraw_proof(&oracle, &proof, &forged_header, RECIPIENT, &f.commit_old, &nullifier, &f.commit_new)
            .unwrap()
    );

    let mut args = withdraw_args(&f, 15);
    args.header_hex = &forged_header;
    assert_eq!(gen_withdraw_proof(&oracle, &args), Ok(None));
}

#[test]
fn withdraw_unsatisfied_returns_none() {
    let oracle = MockOracle::new();
    let f = fixture();
    assert_eq!(gen_withdraw_proof(&oracle, &withdraw_args(&f, 16)), Ok(None));

    // Shielding commitment absent from the blob
    let mut args = withdraw_args(&f, 15);
    args.n = 8;
    let prefix = &f.blob[..8 * 66];
    args.commitments_blob = prefix;
    assert_eq!(gen_withdraw_proof(&oracle, &args), Ok(None));
}

#[test]
fn withdraw_validates_before_proving() {
    let oracle = MockOracle::new();
    let f = fixture();

    let mut args = withdraw_args(&f, 15);
    args.n = 15;
    assert!(matches!(
        gen_withdraw_proof(&oracle, &args),
        Err(Error::Validation(ValidationError::BlobLength { .. }))
    ));

    let mut args = withdraw_args(&f, 15);
    args.recipient_hex = "0x0102";
    assert!(matches!(
        gen_withdraw_proof(&oracle, &args),
        Err(Error::Validation(ValidationError::Length { field: "recipient", .. }))
    ));

    let mut args = withdraw_args(&f, 15);
    let unprefixed = f.commit_old.trim_start_matches("0x").to_string();
    args.commit_old_hex = &unprefixed;
    assert!(matches!(
        gen_withdraw_proof(&oracle, &args),
        Err(Error::Validation(ValidationError::MissingPrefix { .. }))
    ));
}

#[test]
fn verify_rejects_malformed_proof_blob() {
    let oracle = MockOracle::new();
    let f = fixture();
    let nullifier = gen_nullifier(&f.serial_old, &f.randomness_old).unwrap();
    assert!(matches!(
        verify_withdraw_proof(&oracle, "0xnothex", &f.header, RECIPIENT, &f.commit_old, &nullifier, &f.commit_new),
        Err(Error::Validation(ValidationError::InvalidHex { field: "proof" }))
    ));

    // Well-formed blob that is simply wrong
    assert_eq!(
        verify_withdraw_proof(&oracle, "0x02deadbeef", &f.header, RECIPIENT, &f.commit_old, &nullifier, &f.commit_new),
        Ok(false)
    );
}

#[test]
fn deposit_roundtrip_through_hex() {
    let oracle = MockOracle::new();
    let serial_old = u256(1);
    let randomness_old = u256(2);
    let serial_s = u256(3);
    let randomness_s = u256(4);
    let serial_new = u256(5);
    let randomness_new = u256(6);

    let commit_old = gen_commitment(22, &serial_old, &randomness_old).unwrap();
    let commit_s =
        gen_shielding_commitment(8, RECIPIENT, &serial_s, &randomness_s, &serial_old).unwrap();
    let commit_new = gen_commitment(30, &serial_new, &randomness_new).unwrap();
    let nullifier = gen_nullifier(&serial_old, &randomness_old).unwrap();

    let args = DepositProofArgs {
        value_old: 22,
        serial_old_hex: &serial_old,
        randomness_old_hex: &randomness_old,
        commit_old_hex: &commit_old,
        value_s: 8,
        recipient_hex: RECIPIENT,
        serial_s_hex: &serial_s,
        randomness_s_hex: &randomness_s,
        shielding_commit_hex: &commit_s,
        value: 30,
        serial_hex: &serial_new,
        randomness_hex: &randomness_new,
        commit_new_hex: &commit_new,
    };
    let proof = gen_deposit_proof(&oracle, &args).unwrap().expect("satisfiable deposit");
    assert!(verify_deposit_proof(&oracle, &proof, &commit_old, &nullifier, &commit_s, &commit_new).unwrap());
    assert!(!verify_deposit_proof(&oracle, &proof, &commit_new, &nullifier, &commit_s, &commit_old).unwrap());

    let mut wrong = args;
    wrong.value = 31;
    assert_eq!(gen_deposit_proof(&oracle, &wrong), Ok(None));
}

fn balance_args<'a>(
    old: &'a (String, String, String),
    new: &'a (String, String, String),
    value_old: u64,
    value_s: u64,
    value: u64,
) -> BalanceProofArgs<'a> {
    BalanceProofArgs {
        value_old,
        serial_old_hex: &old.0,
        randomness_old_hex: &old.1,
        commit_old_hex: &old.2,
        value_s,
        value,
        serial_hex: &new.0,
        randomness_hex: &new.1,
        commit_new_hex: &new.2,
    }
}

fn note_hex(value: u64, seed: u64) -> (String, String, String) {
    let serial = u256(seed);
    let randomness = u256(seed + 1);
    let commitment = gen_commitment(value, &serial, &randomness).unwrap();
    (serial, randomness, commitment)
}

#[test]
fn convert_and_redeem_through_hex() {
    let oracle = MockOracle::new();
    let old = note_hex(10, 40);
    let nullifier = gen_nullifier(&old.0, &old.1).unwrap();

    let converted = note_hex(16, 50);
    let proof = gen_convert_proof(&oracle, &balance_args(&old, &converted, 10, 6, 16))
        .unwrap()
        .expect("satisfiable convert");
    assert!(verify_convert_proof(&oracle, &proof, &old.2, &nullifier, &converted.2, 6).unwrap());
    assert!(!verify_convert_proof(&oracle, &proof, &old.2, &nullifier, &converted.2, 7).unwrap());
    // Same public inputs, other relation
    assert!(!verify_redeem_proof(&oracle, &proof, &old.2, &nullifier, &converted.2, 6).unwrap());

    let redeemed = note_hex(4, 60);
    let proof = gen_redeem_proof(&oracle, &balance_args(&old, &redeemed, 10, 6, 4))
        .unwrap()
        .expect("satisfiable redeem");
    assert!(verify_redeem_proof(&oracle, &proof, &old.2, &nullifier, &redeemed.2, 6).unwrap());

    assert_eq!(
        gen_redeem_proof(&oracle, &balance_args(&old, &redeemed, 10, 5, 4)),
        Ok(None)
    );
    assert_eq!(
        gen_convert_proof(&oracle, &balance_args(&old, &redeemed, 10, 6, 4)),
        Ok(None)
    );
}

#[test]
fn shielding_note_delivered_through_hex() {
    let keys = RecipientKeys::random();
    let recipient_pk = encode_hex(&keys.public_key());
    let recipient_sk = encode_hex(&keys.secret_key());
    let recipient = encode_hex(&RecipientKeyHash::from_public_key(&keys.public_key()).0);
    let (serial_s, randomness_s, consumed) = (u256(3), u256(4), u256(1));

    let blob = encrypt_shielding_note(8, &serial_s, &randomness_s, &consumed, &recipient_pk).unwrap();
    let opened = decrypt_shielding_note(&blob, &recipient_sk).unwrap();
    assert_eq!(opened.value_s, 8);
    assert_eq!(opened.recipient_hex, recipient);
    assert_eq!(opened.serial_s_hex, serial_s);
    assert_eq!(opened.randomness_s_hex, randomness_s);
    assert_eq!(opened.consumed_serial_hex, consumed);
    assert_eq!(
        opened.shielding_commit_hex,
        gen_shielding_commitment(8, &recipient, &serial_s, &randomness_s, &consumed).unwrap()
    );

    let stranger = encode_hex(&RecipientKeys::random().secret_key());
    assert_eq!(
        decrypt_shielding_note(&blob, &stranger),
        Err(Error::DecryptionFailed)
    );
    assert!(matches!(
        decrypt_shielding_note(&blob[..blob.len() - 2], &recipient_sk),
        Err(Error::Validation(ValidationError::Length { field: "encrypted_note", .. }))
    ));
}
