//! Static chain and token tables
//!
//! Channel ids are the ends of the Terp Network transfer channels as listed in
//! the public chain registry.

use crate::chains::{Chain, Currency, SigningFamily};
use crate::tokens::{ChannelBinding, ContractInfo, Token, TokenKind};

/// Name of the chain every transfer starts or ends on
pub const HOME_CHAIN_NAME: &str = "Terp Network";

/// Source chain preselected when the query string names nothing usable
pub const DEFAULT_SOURCE_CHAIN: &str = "osmosis";

/// Gateway contract that forwards contract-token withdrawals over ICS-20
pub const ICS20_GATEWAY_ADDRESS: &str =
    "terp1tqmms5awftpuhalcv5h5mg76fa0tkdz4jv9ex4q2pjvmsjhqehds2rjalh";
pub const ICS20_GATEWAY_CODE_HASH: &str =
    "f85b413b547b9460162958bafd51113ac266dac96a84c33b9150f68f045f2641";

/// Timeout the gateway applies to forwarded packets (seconds)
pub const ICS20_GATEWAY_TIMEOUT_SECS: u64 = 600;

pub const ETHERMINT_PUBKEY_TYPE_URL: &str = "/ethermint.crypto.v1.ethsecp256k1.PubKey";
pub const INJECTIVE_PUBKEY_TYPE_URL: &str = "/injective.crypto.v1beta1.ethsecp256k1.PubKey";

const TERP_ON_OSMOSIS: &str =
    "ibc/2E7368A14AC9AB7870F32CFEA687551C5064FA861868EDF7437BC877358A81F9";
const TERP_ON_HUB: &str = "ibc/6A5A1D6F9A1A9C9B36E0C32BBCA6FD54B1E6A0D36F4F1B1B1E8E0F3A73A5B7C2";
const TERP_ON_JUNO: &str = "ibc/8B5B6A5D4AA55C3F8E2A4C99E5E38AE7E6EB5F8F4D8E1E35B9B7E1D6A4C6F3A1";
const TERP_ON_EVMOS: &str =
    "ibc/1E6AA4B3E6A5D1C9E7B1F2A3C4D5E6F708192A3B4C5D6E7F8091A2B3C4D5E6F7";
const TERP_ON_INJECTIVE: &str =
    "ibc/7C4D5E6F708192A3B4C5D6E7F8091A2B3C4D5E6F708192A3B4C5D6E7F8091A2B";
const TERP_ON_TERRA: &str =
    "ibc/3A4B5C6D7E8F9012A3B4C5D6E7F8091A2B3C4D5E6F708192A3B4C5D6E7F80912";
const TERP_ON_KUJIRA: &str =
    "ibc/5E6F708192A3B4C5D6E7F8091A2B3C4D5E6F708192A3B4C5D6E7F8091A2B3C4D";
const TERP_ON_CRESCENT: &str =
    "ibc/9A1B2C3D4E5F60718293A4B5C6D7E8F90A1B2C3D4E5F60718293A4B5C6D7E8F9";
const TERP_ON_CHIHUAHUA: &str =
    "ibc/B2C3D4E5F60718293A4B5C6D7E8F90A1B2C3D4E5F60718293A4B5C6D7E8F90A1";
const THIOL_ON_OSMOSIS: &str =
    "ibc/B1C1806A540B3E165A2D42222C59946FB85BA325596FC85662D7047649F419F3";
const ATOM_ON_TERP: &str =
    "ibc/27394FB092D2ECCD56123C74F36E4C1F926001CEADA9CA97EA622B25F41E5EB2";

#[allow(clippy::too_many_arguments)]
fn amino_chain(
    name: &str,
    chain_id: &str,
    lcd: &str,
    rpc: &str,
    prefix: &str,
    deposit_channel: &str,
    withdraw_channel: &str,
    stake: Currency,
    gas_price: f64,
    image: &str,
    explorer: &str,
) -> Chain {
    Chain {
        chain_name: name.to_string(),
        chain_id: chain_id.to_string(),
        lcd: lcd.to_string(),
        rpc: rpc.to_string(),
        bech32_prefix: prefix.to_string(),
        deposit_channel_id: deposit_channel.to_string(),
        withdraw_channel_id: withdraw_channel.to_string(),
        deposit_gas: 150_000,
        withdraw_gas: 150_000,
        gas_denom: stake.coin_minimal_denom.clone(),
        gas_price,
        explorer_account: explorer.to_string(),
        chain_image: image.to_string(),
        coin_type: 118,
        family: SigningFamily::Amino,
        stake_currency: stake,
        needs_suggestion: false,
    }
}

/// Every chain the bridge knows about, home chain first
pub fn chains() -> Vec<Chain> {
    let mut home = amino_chain(
        HOME_CHAIN_NAME,
        "morocco-1",
        "https://terp-api.polkachu.com",
        "https://terp-rpc.polkachu.com",
        "terp",
        "",
        "",
        Currency::new("TERP", "uterp", 6),
        0.05,
        "terp.svg",
        "https://ping.pub/terp/account/",
    );
    home.gas_denom = "uthiol".to_string();

    let osmosis = amino_chain(
        "Osmosis",
        "osmosis-1",
        "https://lcd.osmosis.zone",
        "https://rpc.osmosis.zone",
        "osmo",
        "channel-8691",
        "channel-2",
        Currency::new("OSMO", "uosmo", 6),
        0.025,
        "osmo.svg",
        "https://www.mintscan.io/osmosis/account/",
    );

    let hub = amino_chain(
        "Cosmos Hub",
        "cosmoshub-4",
        "https://cosmos-lcd.quickapi.com",
        "https://cosmos-rpc.quickapi.com",
        "cosmos",
        "channel-839",
        "channel-1",
        Currency::new("ATOM", "uatom", 6),
        0.005,
        "atom.svg",
        "https://www.mintscan.io/cosmos/account/",
    );

    let juno = amino_chain(
        "Juno",
        "juno-1",
        "https://lcd-juno.itastakers.com",
        "https://rpc-juno.itastakers.com",
        "juno",
        "channel-314",
        "channel-0",
        Currency::new("JUNO", "ujuno", 6),
        0.075,
        "juno.svg",
        "https://www.mintscan.io/juno/account/",
    );

    let mut evmos = amino_chain(
        "Evmos",
        "evmos_9001-2",
        "https://rest.bd.evmos.org:1317",
        "https://tendermint.bd.evmos.org:26657",
        "evmos",
        "channel-77",
        "channel-5",
        Currency::new("EVMOS", "aevmos", 18),
        25_000_000_000.0,
        "evmos.svg",
        "https://www.mintscan.io/evmos/account/",
    );
    evmos.coin_type = 60;
    evmos.deposit_gas = 350_000;
    evmos.family = SigningFamily::ethermint(ETHERMINT_PUBKEY_TYPE_URL, 9001);

    let mut injective = amino_chain(
        "Injective",
        "injective-1",
        "https://lcd.injective.network",
        "https://tm.injective.network",
        "inj",
        "channel-163",
        "channel-6",
        Currency::new("INJ", "inj", 18),
        500_000_000.0,
        "inj.svg",
        "https://www.mintscan.io/injective/account/",
    );
    injective.coin_type = 60;
    injective.deposit_gas = 350_000;
    injective.family = SigningFamily::ethermint(INJECTIVE_PUBKEY_TYPE_URL, 9001);
    injective.needs_suggestion = true;

    let mut terra = amino_chain(
        "Terra",
        "phoenix-1",
        "https://phoenix-lcd.terra.dev",
        "https://terra-rpc.polkachu.com",
        "terra",
        "channel-208",
        "channel-7",
        Currency::new("LUNA", "uluna", 6),
        0.015,
        "terra.svg",
        "https://finder.terra.money/mainnet/address/",
    );
    terra.coin_type = 330;
    terra.needs_suggestion = true;

    let mut kujira = amino_chain(
        "Kujira",
        "kaiyo-1",
        "https://lcd.kaiyo.kujira.setten.io",
        "https://rpc.kaiyo.kujira.setten.io",
        "kujira",
        "channel-115",
        "channel-8",
        Currency::new("KUJI", "ukuji", 6),
        0.00125,
        "kuji.svg",
        "https://finder.kujira.app/kaiyo-1/address/",
    );
    kujira.needs_suggestion = true;

    let mut crescent = amino_chain(
        "Crescent",
        "crescent-1",
        "https://mainnet.crescent.network:1317",
        "https://mainnet.crescent.network:26657",
        "cre",
        "channel-58",
        "channel-9",
        Currency::new("CRE", "ucre", 6),
        0.01,
        "cre.svg",
        "https://www.mintscan.io/crescent/account/",
    );
    crescent.needs_suggestion = true;

    let mut chihuahua = amino_chain(
        "Chihuahua",
        "chihuahua-1",
        "https://api.chihuahua.wtf",
        "https://rpc.chihuahua.wtf",
        "chihuahua",
        "channel-44",
        "channel-10",
        Currency::new("HUAHUA", "uhuahua", 6),
        1.0,
        "huahua.svg",
        "https://ping.pub/chihuahua/account/",
    );
    chihuahua.needs_suggestion = true;

    vec![
        home, osmosis, hub, juno, evmos, injective, terra, kujira, crescent, chihuahua,
    ]
}

/// Every bridgeable token; native tokens precede contract tokens
pub fn tokens() -> Vec<Token> {
    let terp_deposits = [
        ("Osmosis", TERP_ON_OSMOSIS),
        ("Cosmos Hub", TERP_ON_HUB),
        ("Juno", TERP_ON_JUNO),
        ("Evmos", TERP_ON_EVMOS),
        ("Injective", TERP_ON_INJECTIVE),
        ("Terra", TERP_ON_TERRA),
        ("Kujira", TERP_ON_KUJIRA),
        ("Crescent", TERP_ON_CRESCENT),
        ("Chihuahua", TERP_ON_CHIHUAHUA),
    ];

    let terp = Token {
        name: "TERP".to_string(),
        description: "Terp Network staking token".to_string(),
        image: "terp.svg".to_string(),
        decimals: 6,
        kind: TokenKind::Native,
        deposits: terp_deposits
            .iter()
            .map(|(chain, denom)| ChannelBinding::new(chain, denom))
            .collect(),
        withdrawals: terp_deposits
            .iter()
            .map(|(chain, _)| ChannelBinding::new(chain, "uterp"))
            .collect(),
    };

    let thiol = Token {
        name: "THIOL".to_string(),
        description: "Terp Network gas token".to_string(),
        image: "thiol.svg".to_string(),
        decimals: 6,
        kind: TokenKind::Native,
        deposits: vec![ChannelBinding::new("Osmosis", THIOL_ON_OSMOSIS)],
        withdrawals: vec![ChannelBinding::new("Osmosis", "uthiol")],
    };

    let atom = Token {
        name: "ATOM".to_string(),
        description: "Cosmos Hub staking token".to_string(),
        image: "atom.svg".to_string(),
        decimals: 6,
        kind: TokenKind::Native,
        deposits: vec![
            ChannelBinding::new("Cosmos Hub", "uatom"),
            ChannelBinding::new(
                "Osmosis",
                "ibc/27394FB092D2ECCD56123C74F36E4C1F926001CEADA9CA97EA622B25F41E5EB2",
            )
            .with_gas(200_000),
        ],
        withdrawals: vec![ChannelBinding::new("Cosmos Hub", ATOM_ON_TERP)],
    };

    let satom = Token {
        name: "sATOM".to_string(),
        description: "Wrapped ATOM held in a private-balance contract".to_string(),
        image: "satom.svg".to_string(),
        decimals: 6,
        kind: TokenKind::Contract(ContractInfo {
            address: "terp1yxjmepvyl2c25vnt53cr2dpn8amknwausxee83zyc0tyzhq5w8aqe2p6mr"
                .to_string(),
            code_hash: "638a3e1d50175fbcb8373cf801565283e3eb23d88a9b7b7f99fcc5eb1e6b561e"
                .to_string(),
        }),
        deposits: vec![ChannelBinding::new("Cosmos Hub", "uatom")],
        withdrawals: vec![ChannelBinding::new(
            "Cosmos Hub",
            "terp1yxjmepvyl2c25vnt53cr2dpn8amknwausxee83zyc0tyzhq5w8aqe2p6mr",
        )
        .with_gas(300_000)],
    };

    vec![terp, thiol, atom, satom]
}
