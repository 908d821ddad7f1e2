//! Static territory outlines as (latitude, longitude) vertex lists.

use super::Vertex;

pub(crate) const MAINLAND: &[Vertex] = &[
    (53.6674971, 122.6939719),
    (53.150137, 125.9569114),
    (49.9477627, 127.9674094),
    (49.1278927, 130.7030051),
    (47.978972, 131.3731712),
    (48.5621472, 135.2156394),
    (44.983056, 133.2085988),
    (44.7104327, 131.4837453),
    (42.2073959, 130.8247168),
    (38.4930728, 122.9110708),
    (36.9767757, 122.7257817),
    (35.0035663, 119.9132817),
    (29.7935805, 123.1280325),
    (24.3887128, 119.4194098),
    (22.3758009, 116.2651975),
    (20.9566154, 110.9807592),
    (19.5963275, 111.3213354),
    (17.8588301, 109.6404272),
    (18.6441328, 108.07468),
    (20.2711127, 108.6240723),
    (20.9798752, 107.8394024),
    (22.2406116, 105.6113712),
    (20.2967692, 101.3575976),
    (23.5689176, 96.9482808),
    (27.1275379, 97.6170537),
    (26.792861, 89.5123437),
    (28.2681686, 82.2030291),
    (31.7165817, 77.5622282),
    (39.1840324, 72.5960537),
    (50.1782642, 86.9640718),
    (42.5590564, 104.8053581),
    (46.8752636, 114.199807),
    (49.8508726, 116.4163017),
    (53.0518996, 119.7012858),
];

pub(crate) const HONG_KONG: &[Vertex] = &[
    (22.3883274, 113.8400876),
    (22.3028391, 113.8065851),
    (22.154, 113.837),
    (22.154, 114.433),
    (22.533, 114.433),
    (22.5649639, 114.3031988),
    (22.5495866, 114.2500695),
    (22.5581474, 114.1700753),
    (22.5305213, 114.1118966),
    (22.5336923, 114.0925847),
    (22.5041186, 114.0527592),
    (22.508298, 114.0080578),
];

pub(crate) const MACAO: &[Vertex] = &[
    (22.217034, 113.528164),
    (22.109142, 113.528164),
    (22.109142, 113.598861),
    (22.217034, 113.598861),
];

pub(crate) const TAIWAN: &[Vertex] = &[
    (25.6407732, 120.8085288),
    (23.833, 119.3),
    (23.183, 119.3),
    (21.281146, 120.1107744),
    (21.8734357, 122.0115783),
    (25.1709126, 122.341084),
];

pub(crate) const KINMEN: &[Vertex] = &[
    (24.4645372, 118.2188829),
    (24.3896902, 118.1404037),
    (24.2986024, 118.280682),
    (24.3574113, 118.5597336),
    (24.555282, 118.4927905),
];

pub(crate) const MATSU: &[Vertex] = &[
    (26.3009417, 119.932271),
    (26.0876682, 119.8321939),
    (25.8512588, 119.9503167),
    (26.4012311, 120.6163596),
    (26.3974008, 120.0850543),
];

pub(crate) const WUQIU: &[Vertex] = &[
    (25.0198348, 119.4303491),
    (24.9470142, 119.4325806),
    (24.9849857, 119.5206429),
];
