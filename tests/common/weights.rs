use std::sync::Arc;
use wct_transfer::nn::{Conv2d, KERNEL_SIZE};
use wct_transfer::topology::LayerSpec;
use wct_transfer::{BackboneWeights, Decoder, StyleTransfer, Topology, TransferParams};

/// Centre-tap layer copying input channel `i` to output channel `i` for
/// every `i` present on both sides; remaining outputs are zero.
pub fn pass_through(spec: &LayerSpec) -> Conv2d {
    let taps = KERNEL_SIZE * KERNEL_SIZE;
    let centre = taps / 2;
    let (cin, cout) = (spec.in_channels, spec.out_channels);
    let mut kernel = vec![0.0; cout * taps * cin];
    for o in 0..cout.min(cin) {
        kernel[(o * taps + centre) * cin + o] = 1.0;
    }
    Conv2d::from_parts(
        spec.name,
        cin,
        cout,
        spec.activation,
        kernel,
        vec![0.0; cout],
    )
    .unwrap()
}

/// Engine whose convolutions only carry the colour channels through, so
/// encode/decode is lossless and the transfer reduces to the WCT chain.
pub fn pass_through_engine(base_channels: usize, params: TransferParams) -> StyleTransfer {
    let topology = Topology::new(base_channels);
    let encoder = topology.encoder_layers().iter().map(pass_through).collect();
    let decoder = topology.decoder_layers().iter().map(pass_through).collect();
    StyleTransfer::new(
        Arc::new(BackboneWeights::from_layers(topology, encoder).unwrap()),
        Decoder::from_layers(topology, decoder).unwrap(),
        params,
    )
    .unwrap()
}
